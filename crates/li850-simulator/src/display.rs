//! Renderers for the simulated OLED.

use std::convert::Infallible;

use li850_core::{
    DeviceState, FrameValues, MonoFrameBuffer, OledRenderer, Renderer,
    ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX},
};
use log::info;

/// Draws into an off-screen frame buffer and prints it to the terminal
/// whenever the picture changes.
pub struct TerminalRenderer {
    oled: OledRenderer<MonoFrameBuffer>,
    previous: Option<[u8; 1024]>,
    ascii: bool,
    last_state: Option<DeviceState>,
}

impl TerminalRenderer {
    pub fn new(ascii: bool) -> Self {
        Self {
            oled: OledRenderer::new(MonoFrameBuffer::new()),
            previous: None,
            ascii,
            last_state: None,
        }
    }

    fn print_frame(&self) {
        let fb = self.oled.display();
        let mut art = String::with_capacity(((DISPLAY_WIDTH_PX + 3) * DISPLAY_HEIGHT_PX / 2) as usize);

        // Two pixel rows per text line keeps the aspect ratio close to square
        for y in (0..DISPLAY_HEIGHT_PX).step_by(2) {
            art.push('|');
            for x in 0..DISPLAY_WIDTH_PX {
                art.push(match (fb.pixel(x, y), fb.pixel(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            art.push_str("|\n");
        }
        println!("{art}");
    }
}

impl Renderer for TerminalRenderer {
    type Error = Infallible;

    fn draw(&mut self, state: DeviceState, values: &FrameValues) -> Result<(), Self::Error> {
        self.oled.draw(state, values)?;

        if self.last_state != Some(state) {
            info!(
                "Screen: {} (CO2 {:.1} ppm, H2O {:.1} mmol/mol)",
                state, values.co2, values.h2o
            );
            self.last_state = Some(state);
        }

        let frame = *self.oled.display().as_bytes();
        if self.ascii && self.previous != Some(frame) {
            self.print_frame();
        }
        self.previous = Some(frame);
        self.oled.display_mut().mark_clean();
        Ok(())
    }
}

#[cfg(feature = "window")]
pub use window::WindowRenderer;

#[cfg(feature = "window")]
mod window {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicBool, Ordering};

    use embedded_graphics::pixelcolor::BinaryColor;
    use embedded_graphics::prelude::*;
    use embedded_graphics_simulator::{
        BinaryColorTheme, OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
        sdl2::Keycode,
    };
    use li850_core::{
        Button, DeviceState, FrameValues, InputLatch, OledRenderer, Renderer,
        ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX},
    };
    use log::info;

    /// Pixel scale factor for the simulator window.
    const WINDOW_SCALE: u32 = 4;

    /// SDL2 window showing the OLED. Arrow keys raise the button latches the
    /// way the edge interrupts would.
    pub struct WindowRenderer {
        oled: OledRenderer<SimulatorDisplay<BinaryColor>>,
        window: Window,
        input: &'static InputLatch,
        quit: &'static AtomicBool,
    }

    impl WindowRenderer {
        pub fn new(input: &'static InputLatch, quit: &'static AtomicBool) -> Self {
            let display = SimulatorDisplay::new(Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX));
            let settings = OutputSettingsBuilder::new()
                .scale(WINDOW_SCALE)
                .theme(BinaryColorTheme::OledBlue)
                .build();

            info!("Keys: Left / Right = buttons, Q = quit");
            Self {
                oled: OledRenderer::new(display),
                window: Window::new("Li-850 Simulator", &settings),
                input,
                quit,
            }
        }
    }

    impl Renderer for WindowRenderer {
        type Error = Infallible;

        fn draw(&mut self, state: DeviceState, values: &FrameValues) -> Result<(), Self::Error> {
            self.oled.draw(state, values)?;

            // The SDL window is created on the first update, which must come
            // before polling events.
            self.window.update(self.oled.display());

            for event in self.window.events() {
                match event {
                    SimulatorEvent::Quit => self.quit.store(true, Ordering::Relaxed),
                    SimulatorEvent::KeyDown { keycode, .. } => {
                        if keycode == Keycode::Left {
                            self.input.on_rising_edge(Button::Left);
                        } else if keycode == Keycode::Right {
                            self.input.on_rising_edge(Button::Right);
                        } else if keycode == Keycode::Q || keycode == Keycode::Escape {
                            self.quit.store(true, Ordering::Relaxed);
                        }
                    }
                    _ => {}
                }
            }
            Ok(())
        }
    }
}
