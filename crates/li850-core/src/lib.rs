//! Hardware-independent core of the Li-850 front-end controller
//!
//! This crate contains the device control loop for a handheld gas-analyzer
//! front-end: the screen/measurement state machine, the interrupt-driven
//! button latch, the periodic sampling timer, CO2/H2O acquisition with a
//! fail-safe sentinel, the sliding-window slope estimator, and the per-session
//! CSV logger.
//!
//! Every piece of hardware the loop touches (analog front-end, real-time
//! clock, storage medium, display, periodic timer) is reached through a small
//! trait, so the same loop runs on the device and on a desktop host (for the
//! simulator and tests).
//!
//! It is `#![no_std]` with `extern crate alloc`.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod input;
pub mod irq_flag;
pub mod sampling;
pub mod state;
pub mod storage;
pub mod time;
pub mod timer;
pub mod ui;

pub use config::{ConfigError, DeviceConfig};
pub use input::{Button, InputLatch};
pub use sampling::{AnalogFrontEnd, ChannelWindows, Sample, SampleAcquirer, SlidingWindow, Slopes};
pub use state::{DeviceState, DeviceStateMachine, Devices};
pub use storage::{LineStorage, LogError, Session, SessionLogger};
pub use time::{Clock, DateTime};
pub use timer::{PeriodicTimer, TickLatch, TimerError, TimerSource};
pub use ui::{FrameValues, MonoFrameBuffer, OledRenderer, Renderer};
