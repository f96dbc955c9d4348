//! CO2/H2O acquisition and trend estimation

mod acquirer;
mod window;

pub use acquirer::*;
pub use window::*;
