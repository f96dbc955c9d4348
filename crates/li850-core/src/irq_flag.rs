//! Boolean flags shared between interrupt handlers and the main loop.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// A single boolean that an interrupt handler may set and the main loop
/// consumes.
///
/// Every access runs inside a critical section, so `take` reads and clears
/// the flag in one step even when an edge fires between the two. Setting an
/// already raised flag is a no-op: edges that arrive before the main loop
/// consumes the flag are coalesced.
pub struct IrqFlag {
    raised: Mutex<CriticalSectionRawMutex, Cell<bool>>,
}

impl IrqFlag {
    /// Create a lowered flag. Usable in `static` items.
    pub const fn new() -> Self {
        Self {
            raised: Mutex::new(Cell::new(false)),
        }
    }

    /// Raise the flag. Never blocks beyond the critical section.
    #[inline]
    pub fn raise(&self) {
        self.raised.lock(|raised| raised.set(true));
    }

    /// Read and clear the flag atomically.
    #[inline]
    pub fn take(&self) -> bool {
        self.raised.lock(|raised| raised.replace(false))
    }

    /// Read the flag without clearing it.
    #[inline]
    pub fn is_raised(&self) -> bool {
        self.raised.lock(|raised| raised.get())
    }

    /// Lower the flag, discarding any pending event.
    #[inline]
    pub fn clear(&self) {
        self.raised.lock(|raised| raised.set(false));
    }
}

impl Default for IrqFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_clears_the_flag_exactly_once() {
        let flag = IrqFlag::new();
        flag.raise();

        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn repeated_raises_coalesce() {
        let flag = IrqFlag::new();
        flag.raise();
        flag.raise();
        flag.raise();

        assert!(flag.take());
        assert!(!flag.is_raised());
    }

    #[test]
    fn flag_is_usable_from_another_thread() {
        static FLAG: IrqFlag = IrqFlag::new();

        std::thread::spawn(|| FLAG.raise()).join().unwrap();

        assert!(FLAG.take());
    }
}
