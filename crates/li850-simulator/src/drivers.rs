//! Desktop stand-ins for the analyzer hardware.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{Datelike, Local, Timelike};
use embedded_hal::delay::DelayNs;
use li850_core::{AnalogFrontEnd, Clock, DateTime, DeviceConfig, LineStorage, PeriodicTimer, TickLatch};
use log::{debug, error};
use thiserror_no_std::Error;

/// Volts per count of a 16-bit converter at the ±6.144 V range.
const ADC_VOLTS_PER_COUNT: f32 = 6.144 / 32768.0;

/// Longest uninterrupted sleep of the timer thread, bounding how long
/// `cancel` waits for it.
const TIMER_POLL_SLICE: Duration = Duration::from_millis(20);

#[derive(Error, Debug)]
pub enum AdcError {
    #[error("Conversion did not complete")]
    ConversionTimeout,
    #[error("No signal wired to ADC channel {0}")]
    NoSuchChannel(u8),
}

/// Analog front-end producing a slow CO2/H2O drift, as seen with the chamber
/// closed over respiring soil.
pub struct SyntheticAnalog {
    started: Instant,
    co2_channel: u8,
    h2o_channel: u8,
    max_voltage: f32,
    co2_full_scale: f32,
    h2o_full_scale: f32,
    fault_every: Option<u32>,
    conversions: u32,
}

impl SyntheticAnalog {
    pub fn new(config: &DeviceConfig, fault_every: Option<u32>) -> Self {
        Self {
            started: Instant::now(),
            co2_channel: config.co2_channel,
            h2o_channel: config.h2o_channel,
            max_voltage: config.max_voltage,
            co2_full_scale: config.co2_full_scale,
            h2o_full_scale: config.h2o_full_scale,
            fault_every: fault_every.filter(|&n| n > 0),
            conversions: 0,
        }
    }

    fn physical(&self, channel: u8) -> Option<(f32, f32)> {
        let t = self.started.elapsed().as_secs_f32();

        if channel == self.co2_channel {
            // ppm: ambient plus a steady rise with a little ripple
            let ppm = 420.0 + 0.8 * t + 3.0 * (t / 7.0).sin();
            Some((ppm, self.co2_full_scale))
        } else if channel == self.h2o_channel {
            let mmol = 12.0 + 0.02 * t + 0.2 * (t / 11.0).cos();
            Some((mmol, self.h2o_full_scale))
        } else {
            None
        }
    }
}

impl AnalogFrontEnd for SyntheticAnalog {
    type Error = AdcError;

    fn read_raw(&mut self, channel: u8) -> Result<i32, Self::Error> {
        self.conversions = self.conversions.wrapping_add(1);
        if let Some(n) = self.fault_every {
            if self.conversions % n == 0 {
                return Err(AdcError::ConversionTimeout);
            }
        }

        let (value, full_scale) = self
            .physical(channel)
            .ok_or(AdcError::NoSuchChannel(channel))?;
        let volts = value / full_scale * self.max_voltage;
        Ok((volts / ADC_VOLTS_PER_COUNT).round() as i32)
    }

    fn raw_to_voltage(&self, raw: i32) -> Result<f32, Self::Error> {
        Ok(raw as f32 * ADC_VOLTS_PER_COUNT)
    }
}

/// Host wall clock in local time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> DateTime {
        let now = Local::now();
        DateTime::new(
            now.year().clamp(0, u16::MAX as i32) as u16,
            now.month() as u8,
            now.day() as u8,
            now.hour() as u8,
            now.minute() as u8,
            now.second() as u8,
        )
    }
}

/// Storage card backed by a host directory.
///
/// Paths under the configured mount point map into `root`. Every append
/// opens, writes and closes the file.
pub struct DirStorage {
    root: PathBuf,
    mount_point: String,
}

impl DirStorage {
    pub fn new(root: impl Into<PathBuf>, mount_point: &str) -> Self {
        Self {
            root: root.into(),
            mount_point: mount_point.to_owned(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn host_path(&self, path: &str) -> PathBuf {
        let relative = path
            .strip_prefix(self.mount_point.as_str())
            .unwrap_or(path)
            .trim_start_matches('/');
        self.root.join(relative)
    }
}

impl LineStorage for DirStorage {
    type Error = io::Error;

    fn append_line(&mut self, path: &str, line: &str) -> Result<(), Self::Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.host_path(path))?;
        file.write_all(line.as_bytes())
    }
}

/// Periodic timer running on a background thread that calls
/// [`TickLatch::on_tick`] like a timer interrupt would.
pub struct ThreadTimer {
    ticks: &'static TickLatch,
    worker: Option<(Arc<AtomicBool>, JoinHandle<()>)>,
}

impl ThreadTimer {
    pub fn new(ticks: &'static TickLatch) -> Self {
        Self {
            ticks,
            worker: None,
        }
    }
}

impl PeriodicTimer for ThreadTimer {
    type Error = io::Error;

    fn start(&mut self, period: Duration) -> Result<(), Self::Error> {
        self.cancel();

        let stop = Arc::new(AtomicBool::new(false));
        let ticks = self.ticks;
        let handle = thread::Builder::new().name("sample-timer".into()).spawn({
            let stop = Arc::clone(&stop);
            move || {
                let mut deadline = Instant::now() + period;
                while !stop.load(Ordering::Acquire) {
                    let now = Instant::now();
                    if now >= deadline {
                        ticks.on_tick();
                        deadline += period;
                        continue;
                    }
                    thread::sleep((deadline - now).min(TIMER_POLL_SLICE));
                }
            }
        })?;

        debug!("Timer thread started, period {:?}", period);
        self.worker = Some((stop, handle));
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some((stop, handle)) = self.worker.take() {
            stop.store(true, Ordering::Release);
            if handle.join().is_err() {
                error!("Timer thread panicked");
            }
            debug!("Timer thread stopped");
        }
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
