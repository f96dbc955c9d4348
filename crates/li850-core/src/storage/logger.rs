use core::fmt::{Debug, Write};

use heapless::String;
use log::{error, info};
use thiserror_no_std::Error;

use super::LineStorage;
use crate::config::MOUNT_POINT_CAPACITY;
use crate::sampling::Sample;
use crate::time::DateTime;

/// Longest log file path, mount point included.
pub const PATH_CAPACITY: usize = 64;

/// Longest CSV record, newline included.
pub const LINE_CAPACITY: usize = 64;

#[derive(Error, Debug)]
pub enum LogError<E: Debug> {
    #[error("No measurement session is active")]
    NoActiveSession,
    #[error("Record does not fit in the line buffer")]
    LineTooLong,
    #[error("Storage write failed: {0:?}")]
    Storage(E),
}

/// One contiguous measurement run, bound to one log file.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    filename: String<PATH_CAPACITY>,
    started_at: DateTime,
    active: bool,
    lines_written: u32,
    lines_dropped: u32,
}

impl Session {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn started_at(&self) -> DateTime {
        self.started_at
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Records successfully appended to the log file.
    pub fn lines_written(&self) -> u32 {
        self.lines_written
    }

    /// Records lost to storage failures.
    pub fn lines_dropped(&self) -> u32 {
        self.lines_dropped
    }

    /// End the session. Closed sessions reject further appends.
    pub fn close(&mut self) {
        if self.active {
            self.active = false;
            info!(
                "Session {} closed: {} lines written, {} dropped",
                self.filename, self.lines_written, self.lines_dropped
            );
        }
    }
}

/// Build the log path for a session started at `now`:
/// `<mount>/data_<year>-<month>-<day>_<hour>:<minute>.txt`, numbers unpadded.
pub fn session_path(mount_point: &str, now: &DateTime) -> Option<String<PATH_CAPACITY>> {
    let mut path = String::new();
    write!(
        path,
        "{}/data_{}-{}-{}_{}:{}.txt",
        mount_point, now.year, now.month, now.day, now.hour, now.minute
    )
    .ok()?;
    Some(path)
}

/// Format one CSV record: `<ISO 8601 timestamp>,<co2 %.2f>,<h2o %.2f>\n`.
pub fn format_record(sample: &Sample) -> Option<String<LINE_CAPACITY>> {
    let mut line = String::new();
    write!(
        line,
        "{},{:.2},{:.2}\n",
        sample.timestamp, sample.co2_ppm, sample.h2o_mmol_per_mol
    )
    .ok()?;
    Some(line)
}

/// Writes the CSV log of each measurement session.
pub struct SessionLogger<S> {
    storage: S,
    mount_point: String<MOUNT_POINT_CAPACITY>,
}

impl<S: LineStorage> SessionLogger<S> {
    pub fn new(storage: S, mount_point: &str) -> Self {
        let mut mount = String::new();
        // Longer mount points are rejected by config validation
        let _ = mount.push_str(mount_point);

        Self {
            storage,
            mount_point: mount,
        }
    }

    /// Open a new session whose file name encodes `now` down to the minute.
    ///
    /// The file is created right away. A creation failure is logged but the
    /// session still starts: every append retries the open.
    pub fn start_session(&mut self, now: DateTime) -> Session {
        let filename = session_path(&self.mount_point, &now).unwrap_or_else(|| {
            // Cannot happen with a validated mount point; fall back to a fixed name.
            let mut fallback = String::new();
            let _ = fallback.push_str("/data.txt");
            fallback
        });

        if let Err(e) = self.storage.create(&filename) {
            error!("Failed to create log file {}: {:?}", filename, e);
        }
        info!("Session started, logging to {}", filename);

        Session {
            filename,
            started_at: now,
            active: true,
            lines_written: 0,
            lines_dropped: 0,
        }
    }

    /// Append one record for `sample` to the session's file.
    ///
    /// A failed write drops the record and counts it in
    /// [`Session::lines_dropped`]; the session stays active.
    pub fn append(&mut self, session: &mut Session, sample: &Sample) -> Result<(), LogError<S::Error>> {
        if !session.active {
            return Err(LogError::NoActiveSession);
        }

        let Some(line) = format_record(sample) else {
            session.lines_dropped += 1;
            error!("Dropping record for {}: line too long", sample.timestamp);
            return Err(LogError::LineTooLong);
        };

        match self.storage.append_line(&session.filename, &line) {
            Ok(()) => {
                session.lines_written += 1;
                Ok(())
            }
            Err(e) => {
                session.lines_dropped += 1;
                error!("Dropping record for {}: {:?}", sample.timestamp, e);
                Err(LogError::Storage(e))
            }
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}
