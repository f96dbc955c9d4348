//! Wall-clock time as reported by the real-time clock.

use core::fmt;

/// Calendar date and time of day, as read from the RTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }
}

/// Formats as ISO 8601 without offset, e.g. `2024-05-03T09:07:05`.
impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Real-time clock driver.
pub trait Clock {
    fn now(&mut self) -> DateTime;
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn now(&mut self) -> DateTime {
        (**self).now()
    }
}
