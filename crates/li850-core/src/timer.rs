//! Periodic sampling timer
//!
//! A hardware (or host) timer calls [`TickLatch::on_tick`] from interrupt
//! context once per sampling period. The tick handler only raises the
//! "sample due" flag; the main loop owns the [`TimerSource`] and consumes the
//! flag, arms the timer when a session starts and disarms it when the session
//! stops.

use core::fmt::Debug;
use core::time::Duration;

use log::{debug, info};
use thiserror_no_std::Error;

use crate::irq_flag::IrqFlag;

/// Driver for a periodic timer that calls [`TickLatch::on_tick`] every period.
pub trait PeriodicTimer {
    type Error: Debug;

    /// Start (or restart) periodic ticks every `period`.
    fn start(&mut self, period: Duration) -> Result<(), Self::Error>;

    /// Stop delivering ticks.
    fn cancel(&mut self);
}

#[derive(Error, Debug)]
pub enum TimerError<E: Debug> {
    #[error("Sampling period must be non-zero")]
    ZeroPeriod,
    #[error("Timer driver failed to start: {0:?}")]
    Driver(E),
}

/// State shared between the timer interrupt and the main loop.
pub struct TickLatch {
    armed: IrqFlag,
    due: IrqFlag,
}

impl TickLatch {
    pub const fn new() -> Self {
        Self {
            armed: IrqFlag::new(),
            due: IrqFlag::new(),
        }
    }

    /// Interrupt-context entry point for one timer period elapsing.
    ///
    /// Ticks delivered while the latch is disarmed are ignored.
    pub fn on_tick(&self) {
        critical_section::with(|_| {
            if self.armed.is_raised() {
                self.due.raise();
            }
        });
    }

    fn arm(&self) {
        critical_section::with(|_| {
            self.due.clear();
            self.armed.raise();
        });
    }

    fn disarm(&self) {
        critical_section::with(|_| {
            self.armed.clear();
            self.due.clear();
        });
    }

    fn take_due(&self) -> bool {
        self.due.take()
    }

    fn is_armed(&self) -> bool {
        self.armed.is_raised()
    }
}

impl Default for TickLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Main-loop side of the sampling timer.
pub struct TimerSource<'a, T> {
    timer: T,
    ticks: &'a TickLatch,
    period: Option<Duration>,
}

impl<'a, T: PeriodicTimer> TimerSource<'a, T> {
    pub fn new(timer: T, ticks: &'a TickLatch) -> Self {
        Self {
            timer,
            ticks,
            period: None,
        }
    }

    /// Arm the timer at `period`, discarding any stale due flag.
    pub fn arm(&mut self, period: Duration) -> Result<(), TimerError<T::Error>> {
        if period.is_zero() {
            return Err(TimerError::ZeroPeriod);
        }

        self.ticks.arm();
        if let Err(e) = self.timer.start(period) {
            self.ticks.disarm();
            self.period = None;
            return Err(TimerError::Driver(e));
        }

        info!("Sampling timer armed, period {} ms", period.as_millis());
        self.period = Some(period);
        Ok(())
    }

    /// Stop the timer. Once this returns no tick is reported as due until
    /// the timer is armed again.
    pub fn disarm(&mut self) {
        self.ticks.disarm();
        self.timer.cancel();
        if self.period.take().is_some() {
            info!("Sampling timer disarmed");
        }
    }

    /// Consume the "sample due" flag.
    pub fn take_due(&mut self) -> bool {
        let due = self.ticks.take_due();
        if due {
            debug!("Sampling tick due");
        }
        due
    }

    pub fn is_armed(&self) -> bool {
        self.ticks.is_armed()
    }

    /// Period the timer is currently armed at.
    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// The underlying timer driver.
    pub fn driver(&self) -> &T {
        &self.timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingTimer {
        started: Option<Duration>,
        cancels: u32,
        fail: bool,
    }

    impl PeriodicTimer for CountingTimer {
        type Error = &'static str;

        fn start(&mut self, period: Duration) -> Result<(), Self::Error> {
            if self.fail {
                return Err("no timer available");
            }
            self.started = Some(period);
            Ok(())
        }

        fn cancel(&mut self) {
            self.started = None;
            self.cancels += 1;
        }
    }

    #[test]
    fn ticks_are_ignored_until_armed() {
        let ticks = TickLatch::new();
        let mut source = TimerSource::new(CountingTimer::default(), &ticks);

        ticks.on_tick();
        assert!(!source.take_due());

        source.arm(Duration::from_secs(2)).unwrap();
        ticks.on_tick();
        assert!(source.take_due());
        assert!(!source.take_due());
        assert_eq!(source.driver().started, Some(Duration::from_secs(2)));
    }

    #[test]
    fn disarm_drops_pending_tick() {
        let ticks = TickLatch::new();
        let mut source = TimerSource::new(CountingTimer::default(), &ticks);
        source.arm(Duration::from_secs(1)).unwrap();

        ticks.on_tick();
        source.disarm();
        ticks.on_tick();

        assert!(!source.take_due());
        assert!(!source.is_armed());
        assert_eq!(source.period(), None);
        assert_eq!(source.driver().cancels, 1);
    }

    #[test]
    fn failed_start_leaves_latch_disarmed() {
        let ticks = TickLatch::new();
        let timer = CountingTimer {
            fail: true,
            ..Default::default()
        };
        let mut source = TimerSource::new(timer, &ticks);

        let result = source.arm(Duration::from_secs(1));

        assert!(matches!(result, Err(TimerError::Driver("no timer available"))));
        assert!(!source.is_armed());
    }

    #[test]
    fn source_can_be_embedded_without_repeating_the_driver_bound() {
        struct Owner<'a, T> {
            timer: TimerSource<'a, T>,
        }

        let ticks = TickLatch::new();
        let owner = Owner {
            timer: TimerSource::new(CountingTimer::default(), &ticks),
        };
        assert!(!owner.timer.is_armed());
    }

    #[test]
    fn zero_period_is_rejected() {
        let ticks = TickLatch::new();
        let mut source = TimerSource::new(CountingTimer::default(), &ticks);

        assert!(matches!(
            source.arm(Duration::ZERO),
            Err(TimerError::ZeroPeriod)
        ));
    }
}
