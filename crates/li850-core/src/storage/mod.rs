//! Persistent measurement logs
//!
//! Each measurement session writes one CSV file on the mounted storage
//! medium. Lines are appended with an independent open/write/close per
//! sample, so a power loss costs at most the line being written.

mod logger;

pub use logger::*;

use core::fmt::Debug;

/// Storage medium that can append text lines to files.
///
/// Mounting is done once at boot, before the control loop starts.
pub trait LineStorage {
    type Error: Debug;

    /// Open `path` for appending (creating it if missing), write `line` and
    /// close the file again.
    fn append_line(&mut self, path: &str, line: &str) -> Result<(), Self::Error>;

    /// Make sure `path` exists without adding content.
    fn create(&mut self, path: &str) -> Result<(), Self::Error> {
        self.append_line(path, "")
    }
}

impl<S: LineStorage + ?Sized> LineStorage for &mut S {
    type Error = S::Error;

    fn append_line(&mut self, path: &str, line: &str) -> Result<(), Self::Error> {
        (**self).append_line(path, line)
    }

    fn create(&mut self, path: &str) -> Result<(), Self::Error> {
        (**self).create(path)
    }
}
