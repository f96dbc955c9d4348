//! In-memory stand-ins for the analyzer hardware.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use li850_core::{
    AnalogFrontEnd, Clock, DateTime, DeviceConfig, DeviceState, DeviceStateMachine, Devices,
    FrameValues, InputLatch, LineStorage, PeriodicTimer, Renderer, TickLatch,
};

pub const T0: DateTime = DateTime::new(2024, 5, 3, 9, 7, 5);

/// Converter whose raw counts are millivolts.
///
/// Clones share the channel values and the failure switch, so a test can keep
/// one handle while the state machine owns the other.
#[derive(Clone)]
pub struct FakeAnalog {
    millivolts: Rc<Cell<[i32; 2]>>,
    failing: Rc<Cell<bool>>,
}

impl FakeAnalog {
    pub fn new(co2_mv: i32, h2o_mv: i32) -> Self {
        Self {
            millivolts: Rc::new(Cell::new([co2_mv, h2o_mv])),
            failing: Rc::new(Cell::new(false)),
        }
    }

    pub fn set(&self, co2_mv: i32, h2o_mv: i32) {
        self.millivolts.set([co2_mv, h2o_mv]);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl AnalogFrontEnd for FakeAnalog {
    type Error = &'static str;

    fn read_raw(&mut self, channel: u8) -> Result<i32, Self::Error> {
        if self.failing.get() {
            return Err("conversion timeout");
        }
        self.millivolts
            .get()
            .get(channel as usize)
            .copied()
            .ok_or("no such channel")
    }

    fn raw_to_voltage(&self, raw: i32) -> Result<f32, Self::Error> {
        Ok(raw as f32 / 1000.0)
    }
}

#[derive(Clone)]
pub struct FakeClock(Rc<Cell<DateTime>>);

impl FakeClock {
    pub fn new(now: DateTime) -> Self {
        Self(Rc::new(Cell::new(now)))
    }

    pub fn set(&self, now: DateTime) {
        self.0.set(now);
    }
}

impl Clock for FakeClock {
    fn now(&mut self) -> DateTime {
        self.0.get()
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    pub files: Vec<(String, String)>,
    pub fail_writes: bool,
}

impl MemoryStorage {
    pub fn contents(&self, path: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, contents)| contents.as_str())
    }

    pub fn lines(&self, path: &str) -> Vec<&str> {
        self.contents(path)
            .map(|c| c.lines().collect())
            .unwrap_or_default()
    }
}

impl LineStorage for MemoryStorage {
    type Error = &'static str;

    fn append_line(&mut self, path: &str, line: &str) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err("card removed");
        }
        match self.files.iter_mut().find(|(p, _)| p == path) {
            Some((_, contents)) => contents.push_str(line),
            None => self.files.push((path.to_owned(), line.to_owned())),
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingRenderer {
    pub frames: Vec<(DeviceState, FrameValues)>,
}

impl RecordingRenderer {
    pub fn last(&self) -> (DeviceState, FrameValues) {
        *self.frames.last().expect("nothing rendered yet")
    }
}

impl Renderer for RecordingRenderer {
    type Error = core::convert::Infallible;

    fn draw(&mut self, state: DeviceState, values: &FrameValues) -> Result<(), Self::Error> {
        self.frames.push((state, *values));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTimer {
    pub starts: Vec<Duration>,
    pub running: Option<Duration>,
    pub cancels: u32,
}

impl PeriodicTimer for FakeTimer {
    type Error = &'static str;

    fn start(&mut self, period: Duration) -> Result<(), Self::Error> {
        self.starts.push(period);
        self.running = Some(period);
        Ok(())
    }

    fn cancel(&mut self) {
        self.running = None;
        self.cancels += 1;
    }
}

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct NoopDelay {
    pub total_ns: u64,
}

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

pub type Machine<'a> = DeviceStateMachine<
    'a,
    FakeAnalog,
    FakeClock,
    MemoryStorage,
    RecordingRenderer,
    FakeTimer,
    NoopDelay,
>;

pub fn machine<'a>(
    config: DeviceConfig,
    input: &'a InputLatch,
    ticks: &'a TickLatch,
    analog: &FakeAnalog,
    clock: &FakeClock,
) -> Machine<'a> {
    DeviceStateMachine::new(
        config,
        input,
        ticks,
        Devices {
            analog: analog.clone(),
            clock: clock.clone(),
            storage: MemoryStorage::default(),
            renderer: RecordingRenderer::default(),
            timer: FakeTimer::default(),
            delay: NoopDelay::default(),
        },
    )
    .unwrap()
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-2,
        "expected {expected}, got {actual}"
    );
}
