//! Button input latch
//!
//! The two front-panel buttons trigger rising-edge interrupts. The interrupt
//! handlers only raise a dedicated [`IrqFlag`]; the main loop consumes the
//! flags once per iteration. There is no queue: a second press before the
//! loop polls is merged into the first.

use log::debug;

use crate::irq_flag::IrqFlag;

/// The physical buttons below the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Selects the option printed in the bottom-left box.
    Left,
    /// Selects the option printed in the bottom-right box.
    Right,
}

/// One latched flag per physical button.
pub struct InputLatch {
    left: IrqFlag,
    right: IrqFlag,
}

impl InputLatch {
    pub const fn new() -> Self {
        Self {
            left: IrqFlag::new(),
            right: IrqFlag::new(),
        }
    }

    /// The flag belonging to one button.
    ///
    /// Hand this to the edge interrupt of that button so the handler can
    /// touch nothing else.
    pub fn flag(&self, button: Button) -> &IrqFlag {
        match button {
            Button::Left => &self.left,
            Button::Right => &self.right,
        }
    }

    /// Interrupt-context entry point for a rising edge on `button`.
    #[inline]
    pub fn on_rising_edge(&self, button: Button) {
        self.flag(button).raise();
    }

    /// Read and clear the flag of `button`. Main loop only.
    pub fn poll_and_consume(&self, button: Button) -> bool {
        self.flag(button).take()
    }

    /// Consume at most one press, left before right.
    ///
    /// When both buttons are latched the right press stays pending and is
    /// returned by the next call.
    pub fn next_press(&self) -> Option<Button> {
        let press = if self.poll_and_consume(Button::Left) {
            Some(Button::Left)
        } else if self.poll_and_consume(Button::Right) {
            Some(Button::Right)
        } else {
            None
        };

        if let Some(button) = press {
            debug!("Button press consumed: {:?}", button);
        }
        press
    }

    /// Drop every pending press.
    pub fn discard_all(&self) {
        self.left.clear();
        self.right.clear();
    }
}

impl Default for InputLatch {
    fn default() -> Self {
        Self::new()
    }
}
