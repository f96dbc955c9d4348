//! Display output
//!
//! The control loop hands every frame to a [`Renderer`] as the current state
//! plus the values to show. [`OledRenderer`] draws the analyzer's menu
//! screens on any 128x64 monochrome `DrawTarget`; [`MonoFrameBuffer`] is an
//! off-screen target in SSD1306 page layout.

mod framebuffer;
mod screens;

pub use framebuffer::MonoFrameBuffer;
pub use screens::OledRenderer;

use core::fmt::Debug;

use crate::state::DeviceState;
use crate::time::DateTime;

pub const DISPLAY_WIDTH_PX: u32 = 128;
pub const DISPLAY_HEIGHT_PX: u32 = 64;

/// Values accompanying a render request.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameValues {
    /// Latest CO2 reading in ppm.
    pub co2: f32,
    /// Latest H2O reading in mmol/mol.
    pub h2o: f32,
    /// CO2 trend in ppm per minute, while a session is running.
    pub slope_co2: Option<f32>,
    /// H2O trend in mmol/mol per minute, while a session is running.
    pub slope_h2o: Option<f32>,
    /// Wall-clock time, for the clock screen.
    pub clock: Option<DateTime>,
}

/// Display driver consuming one render request per loop iteration.
pub trait Renderer {
    type Error: Debug;

    fn draw(&mut self, state: DeviceState, values: &FrameValues) -> Result<(), Self::Error>;
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    type Error = R::Error;

    fn draw(&mut self, state: DeviceState, values: &FrameValues) -> Result<(), Self::Error> {
        (**self).draw(state, values)
    }
}
