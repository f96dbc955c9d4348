//! RAM framebuffer for 128x64 monochrome OLED panels.
//!
//! Pixels are packed in SSD1306 page order: byte `page * 128 + x` holds the
//! eight vertical pixels `y = page * 8 ..= page * 8 + 7`, least significant
//! bit on top. A display driver can stream [`MonoFrameBuffer::as_bytes`]
//! straight into the panel's GDDRAM.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use super::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

const WIDTH: usize = DISPLAY_WIDTH_PX as usize;
const HEIGHT: usize = DISPLAY_HEIGHT_PX as usize;
const BUFFER_LEN: usize = WIDTH * HEIGHT / 8;

/// Off-screen 128x64 draw target with change tracking.
pub struct MonoFrameBuffer {
    buffer: [u8; BUFFER_LEN],
    dirty: bool,
}

impl Default for MonoFrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl MonoFrameBuffer {
    /// A blank (all pixels off) framebuffer.
    pub const fn new() -> Self {
        Self {
            buffer: [0; BUFFER_LEN],
            dirty: false,
        }
    }

    #[inline]
    fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        let idx = (y / 8) * WIDTH + x;
        let mask = 1u8 << (y % 8);
        let old = self.buffer[idx];
        let new = if on { old | mask } else { old & !mask };
        if new != old {
            self.buffer[idx] = new;
            self.dirty = true;
        }
    }

    /// Whether the pixel at (`x`, `y`) is on. Out-of-range pixels are off.
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        let (x, y) = (x as usize, y as usize);
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }
        self.buffer[(y / 8) * WIDTH + x] & (1 << (y % 8)) != 0
    }

    /// Number of pixels that are on.
    pub fn lit_pixels(&self) -> u32 {
        self.buffer.iter().map(|b| b.count_ones()).sum()
    }

    /// Raw buffer in SSD1306 page layout.
    pub fn as_bytes(&self) -> &[u8; BUFFER_LEN] {
        &self.buffer
    }

    /// Whether any pixel changed since the last [`mark_clean`](Self::mark_clean).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl OriginDimensions for MonoFrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
    }
}

impl DrawTarget for MonoFrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let (x, y) = (coord.x, coord.y);
            if x >= 0 && y >= 0 && (x as usize) < WIDTH && (y as usize) < HEIGHT {
                self.set_pixel(x as usize, y as usize, color.is_on());
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let fill = if color.is_on() { 0xFF } else { 0x00 };
        if self.buffer.iter().any(|&b| b != fill) {
            self.buffer.fill(fill);
            self.dirty = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::Drawable;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    #[test]
    fn pixels_use_page_layout() {
        let mut fb = MonoFrameBuffer::new();
        Pixel(Point::new(3, 10), BinaryColor::On).draw(&mut fb).unwrap();

        assert!(fb.pixel(3, 10));
        assert_eq!(fb.as_bytes()[WIDTH + 3], 0b0000_0100);
        assert_eq!(fb.lit_pixels(), 1);
    }

    #[test]
    fn out_of_bounds_pixels_are_clipped() {
        let mut fb = MonoFrameBuffer::new();
        Rectangle::new(Point::new(120, 60), Size::new(20, 20))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut fb)
            .unwrap();

        assert_eq!(fb.lit_pixels(), 8 * 4);
        assert!(!fb.pixel(130, 70));
    }

    #[test]
    fn dirty_only_on_change() {
        let mut fb = MonoFrameBuffer::new();
        fb.clear(BinaryColor::Off).unwrap();
        assert!(!fb.is_dirty());

        Pixel(Point::new(0, 0), BinaryColor::On).draw(&mut fb).unwrap();
        assert!(fb.is_dirty());

        fb.mark_clean();
        Pixel(Point::new(0, 0), BinaryColor::On).draw(&mut fb).unwrap();
        assert!(!fb.is_dirty());

        fb.clear(BinaryColor::Off).unwrap();
        assert!(fb.is_dirty());
        assert_eq!(fb.lit_pixels(), 0);
    }
}
