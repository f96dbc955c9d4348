//! Menu screens of the analyzer front-end.
//!
//! Every screen has a title on the first line and, except for the diagnostic
//! screen, two boxed labels at the bottom naming what the left and right
//! buttons do.

use core::fmt::{Debug, Write};

use embedded_graphics::Drawable;
use embedded_graphics::mono_font::ascii::{FONT_6X9, FONT_6X10};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use heapless::String;

use super::{DISPLAY_WIDTH_PX, FrameValues, Renderer};
use crate::state::DeviceState;

const OPTION_BOX_Y: i32 = 54;
const OPTION_BOX_HEIGHT: u32 = 10;
const OPTION_CHAR_WIDTH: u32 = 6;
const OPTION_PADDING: u32 = 6;

/// Width of the box framing a bottom option label.
pub const fn option_box_width(label: &str) -> u32 {
    label.len() as u32 * OPTION_CHAR_WIDTH + OPTION_PADDING
}

/// Labels of the (left, right) option boxes for `state`.
pub const fn option_labels(state: DeviceState) -> Option<(&'static str, &'static str)> {
    match state {
        DeviceState::Startup => Some(("Time", "Instant")),
        DeviceState::ShowTime => Some(("Update", "Back")),
        DeviceState::Instant | DeviceState::Stopped => Some(("Start", "Back")),
        DeviceState::Measuring => Some(("Slope", "Stop")),
        DeviceState::Slope => Some(("Meas", "Stop")),
        DeviceState::Fault => None,
    }
}

/// Draws the analyzer screens on a 128x64 monochrome display.
pub struct OledRenderer<D> {
    display: D,
}

impl<D> OledRenderer<D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    pub fn new(display: D) -> Self {
        Self { display }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn into_inner(self) -> D {
        self.display
    }

    fn text(&mut self, text: &str, position: Point, font: &MonoFont<'_>) -> Result<(), D::Error> {
        Text::with_baseline(
            text,
            position,
            MonoTextStyle::new(font, BinaryColor::On),
            Baseline::Top,
        )
        .draw(&mut self.display)?;
        Ok(())
    }

    fn title(&mut self, title: &str) -> Result<(), D::Error> {
        self.text(title, Point::zero(), &FONT_6X9)
    }

    fn options(&mut self, left: &str, right: &str) -> Result<(), D::Error> {
        let frame = PrimitiveStyle::with_stroke(BinaryColor::On, 1);

        let left_width = option_box_width(left);
        Rectangle::new(
            Point::new(0, OPTION_BOX_Y),
            Size::new(left_width, OPTION_BOX_HEIGHT),
        )
        .into_styled(frame)
        .draw(&mut self.display)?;
        self.text(left, Point::new(3, OPTION_BOX_Y + 1), &FONT_6X9)?;

        let right_width = option_box_width(right);
        let right_x = DISPLAY_WIDTH_PX.saturating_sub(right_width) as i32;
        Rectangle::new(
            Point::new(right_x, OPTION_BOX_Y),
            Size::new(right_width, OPTION_BOX_HEIGHT),
        )
        .into_styled(frame)
        .draw(&mut self.display)?;
        self.text(right, Point::new(right_x + 3, OPTION_BOX_Y + 1), &FONT_6X9)
    }

    /// One formatted body line.
    fn value_line(&mut self, position: Point, args: core::fmt::Arguments<'_>) -> Result<(), D::Error> {
        self.text(&body_line(args), position, &FONT_6X10)
    }

    fn draw_clock(&mut self, values: &FrameValues) -> Result<(), D::Error> {
        self.title("Current Time")?;

        let Some(now) = values.clock else {
            return self.text("Clock unavailable", Point::new(5, 18), &FONT_6X9);
        };

        let fields = [
            ("Month", now.month),
            ("Day", now.day),
            ("Hour", now.hour),
            ("Minutes", now.minute),
            ("Seconds", now.second),
        ];
        for (row, (name, value)) in fields.into_iter().enumerate() {
            let mut line: String<24> = String::new();
            let _ = write!(line, "{}: {}", name, value);
            self.text(&line, Point::new(5, 9 + 9 * row as i32), &FONT_6X9)?;
        }
        Ok(())
    }

    fn draw_readings(&mut self, title: &str, values: &FrameValues) -> Result<(), D::Error> {
        self.title(title)?;
        self.value_line(Point::new(5, 15), format_args!("CO2 : {:.1}", values.co2))?;
        self.value_line(Point::new(5, 30), format_args!("H2O : {:.1}", values.h2o))
    }

    fn draw_slopes(&mut self, values: &FrameValues) -> Result<(), D::Error> {
        self.title("Measuring...")?;
        self.value_line(Point::new(5, 11), format_args!("CO2 : {:.1}", values.co2))?;
        self.value_line(Point::new(5, 21), format_args!("H2O : {:.1}", values.h2o))?;
        let [co2_line, h2o_line] = slope_lines(values);
        self.text(&co2_line, Point::new(5, 32), &FONT_6X10)?;
        self.text(&h2o_line, Point::new(5, 42), &FONT_6X10)
    }
}

fn body_line(args: core::fmt::Arguments<'_>) -> String<24> {
    let mut line = String::new();
    // Overlong values are truncated rather than skipped
    let _ = line.write_fmt(args);
    line
}

/// Trend lines of the slope screen, CO2 first.
fn slope_lines(values: &FrameValues) -> [String<24>; 2] {
    [
        body_line(format_args!("dCO2: {:.1} /min", values.slope_co2.unwrap_or(0.0))),
        body_line(format_args!("dH2O: {:.2} /min", values.slope_h2o.unwrap_or(0.0))),
    ]
}

impl<D> Renderer for OledRenderer<D>
where
    D: DrawTarget<Color = BinaryColor>,
    D::Error: Debug,
{
    type Error = D::Error;

    fn draw(&mut self, state: DeviceState, values: &FrameValues) -> Result<(), Self::Error> {
        self.display.clear(BinaryColor::Off)?;

        match state {
            DeviceState::Startup => self.title("Startup of Li850")?,
            DeviceState::ShowTime => self.draw_clock(values)?,
            DeviceState::Instant | DeviceState::Stopped => {
                self.draw_readings("Read. CO2 & H2O", values)?
            }
            DeviceState::Measuring => self.draw_readings("Measuring...", values)?,
            DeviceState::Slope => self.draw_slopes(values)?,
            DeviceState::Fault => {
                return self.text("BUG", Point::new(0, 50), &FONT_6X10);
            }
        }

        if let Some((left, right)) = option_labels(state) {
            self.options(left, right)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::DateTime;
    use crate::ui::MonoFrameBuffer;

    fn render(state: DeviceState, values: &FrameValues) -> MonoFrameBuffer {
        let mut renderer = OledRenderer::new(MonoFrameBuffer::new());
        renderer.draw(state, values).unwrap();
        renderer.into_inner()
    }

    #[test]
    fn option_boxes_sit_in_the_bottom_corners() {
        let fb = render(DeviceState::Startup, &FrameValues::default());

        // Left box "Time" spans x = 0..30, right box "Instant" ends at x = 127.
        assert!(fb.pixel(0, 54));
        assert!(fb.pixel(option_box_width("Time") - 1, 63));
        assert!(fb.pixel(127, 54));
        assert!(fb.pixel(128 - option_box_width("Instant"), 63));
    }

    #[test]
    fn fault_screen_has_no_options() {
        let fb = render(DeviceState::Fault, &FrameValues::default());

        assert!(fb.lit_pixels() > 0);
        assert!(!fb.pixel(0, 54));
        assert!(!fb.pixel(127, 54));
        assert_eq!(option_labels(DeviceState::Fault), None);
    }

    #[test]
    fn readings_change_the_picture() {
        let low = FrameValues {
            co2: 400.0,
            h2o: 10.0,
            ..Default::default()
        };
        let high = FrameValues { co2: 9999.0, ..low };

        let a = render(DeviceState::Instant, &low);
        let b = render(DeviceState::Instant, &high);

        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn stopped_looks_like_instant() {
        let values = FrameValues {
            co2: 412.0,
            h2o: 11.0,
            ..Default::default()
        };
        let stopped = render(DeviceState::Stopped, &values);
        let instant = render(DeviceState::Instant, &values);

        assert_eq!(stopped.as_bytes(), instant.as_bytes());
    }

    #[test]
    fn slope_screen_differs_from_measuring_screen() {
        let values = FrameValues {
            co2: 412.0,
            h2o: 11.0,
            slope_co2: Some(12.5),
            slope_h2o: Some(-0.25),
            clock: None,
        };
        let measuring = render(DeviceState::Measuring, &values);
        let slope = render(DeviceState::Slope, &values);

        assert_ne!(measuring.as_bytes(), slope.as_bytes());
    }

    #[test]
    fn slope_lines_are_unsigned_per_minute_rates() {
        let values = FrameValues {
            slope_co2: Some(12.5),
            slope_h2o: Some(-0.25),
            ..Default::default()
        };
        let [co2, h2o] = slope_lines(&values);
        assert_eq!(co2.as_str(), "dCO2: 12.5 /min");
        assert_eq!(h2o.as_str(), "dH2O: -0.25 /min");

        let [co2, h2o] = slope_lines(&FrameValues::default());
        assert_eq!(co2.as_str(), "dCO2: 0.0 /min");
        assert_eq!(h2o.as_str(), "dH2O: 0.00 /min");
    }

    #[test]
    fn clock_screen_shows_time_fields() {
        let with_clock = FrameValues {
            clock: Some(DateTime::new(2024, 5, 3, 9, 7, 5)),
            ..Default::default()
        };
        let later = FrameValues {
            clock: Some(DateTime::new(2024, 5, 3, 9, 7, 6)),
            ..Default::default()
        };

        let a = render(DeviceState::ShowTime, &with_clock);
        let b = render(DeviceState::ShowTime, &later);
        let none = render(DeviceState::ShowTime, &FrameValues::default());

        assert_ne!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), none.as_bytes());
    }
}
