//! Device states and the button transition table
//!
//! The table is total: every `(state, button)` pair resolves to a state.
//! [`DeviceStateMachine`] applies the side effects (session start/stop,
//! timer arming) that go with each transition.

mod machine;

pub use machine::{DeviceStateMachine, Devices};

use crate::input::Button;

/// Screen / measurement state of the analyzer front-end.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceState {
    #[default]
    Startup = 0,
    ShowTime = 1,
    Instant = 2,
    Measuring = 3,
    Slope = 4,
    Stopped = 5,
    /// Reached only through an unrecognized raw state code.
    Fault = 0xFF,
}

impl DeviceState {
    /// Map a raw state code to a state. Unknown codes map to [`DeviceState::Fault`].
    pub const fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Startup,
            1 => Self::ShowTime,
            2 => Self::Instant,
            3 => Self::Measuring,
            4 => Self::Slope,
            5 => Self::Stopped,
            _ => Self::Fault,
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Startup => "Startup",
            Self::ShowTime => "ShowTime",
            Self::Instant => "Instant",
            Self::Measuring => "Measuring",
            Self::Slope => "Slope",
            Self::Stopped => "Stopped",
            Self::Fault => "Fault",
        }
    }

    /// Whether the sampling timer runs in this state.
    pub const fn samples_periodically(self) -> bool {
        matches!(self, Self::Measuring | Self::Slope)
    }

    /// Whether a fresh reading is taken for every displayed frame.
    pub const fn samples_every_frame(self) -> bool {
        matches!(self, Self::Instant | Self::Stopped)
    }

    /// Next state after `button` is pressed in this state.
    pub const fn next_state(self, button: Button) -> Self {
        match (self, button) {
            (Self::Startup, Button::Left) => Self::ShowTime,
            (Self::Startup, Button::Right) => Self::Instant,

            // Left refreshes the clock in place
            (Self::ShowTime, Button::Left) => Self::ShowTime,
            (Self::ShowTime, Button::Right) => Self::Startup,

            (Self::Instant | Self::Stopped, Button::Left) => Self::Measuring,
            (Self::Instant | Self::Stopped, Button::Right) => Self::Startup,

            (Self::Measuring, Button::Left) => Self::Slope,
            (Self::Slope, Button::Left) => Self::Measuring,
            (Self::Measuring | Self::Slope, Button::Right) => Self::Stopped,

            (Self::Fault, _) => Self::Startup,
        }
    }
}

impl core::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [DeviceState; 7] = [
        DeviceState::Startup,
        DeviceState::ShowTime,
        DeviceState::Instant,
        DeviceState::Measuring,
        DeviceState::Slope,
        DeviceState::Stopped,
        DeviceState::Fault,
    ];

    #[test]
    fn codes_round_trip_and_unknown_codes_fault() {
        for state in ALL {
            assert_eq!(DeviceState::from_code(state.code()), state);
        }
        assert_eq!(DeviceState::from_code(6), DeviceState::Fault);
        assert_eq!(DeviceState::from_code(42), DeviceState::Fault);
    }

    #[test]
    fn transition_table() {
        use Button::{Left, Right};
        use DeviceState::*;

        let expected = [
            (Startup, Left, ShowTime),
            (Startup, Right, Instant),
            (ShowTime, Left, ShowTime),
            (ShowTime, Right, Startup),
            (Instant, Left, Measuring),
            (Instant, Right, Startup),
            (Measuring, Left, Slope),
            (Measuring, Right, Stopped),
            (Slope, Left, Measuring),
            (Slope, Right, Stopped),
            (Stopped, Left, Measuring),
            (Stopped, Right, Startup),
            (Fault, Left, Startup),
            (Fault, Right, Startup),
        ];

        for (from, button, to) in expected {
            assert_eq!(from.next_state(button), to, "{from} + {button:?}");
        }
    }

    #[test]
    fn only_session_states_sample_periodically() {
        let periodic: Vec<_> = ALL.into_iter().filter(|s| s.samples_periodically()).collect();
        assert_eq!(periodic, [DeviceState::Measuring, DeviceState::Slope]);
    }
}
