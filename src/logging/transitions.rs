use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;

use crate::core::diff::{PeerChanges, TransitionEvent};

pub const UPDATE_LOG: &str = "updates.log";
pub const ERROR_LOG: &str = "errors.log";

#[derive(Debug, Error)]
#[error("failed to append to {}: {source}", .log.display())]
pub struct LogError {
    pub log: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Durable, append-only record of every connectivity transition.
///
/// `updates.log` is the audit trail; `errors.log` receives failures of the
/// audit trail itself before they are re-raised to the caller.
#[derive(Debug)]
pub struct TransitionLog {
    dir: PathBuf,
    updates: File,
    errors: File,
}

impl TransitionLog {
    /// Creates the directory and opens both channels for appending; the
    /// handles live for the process lifetime.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, LogError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| LogError {
            log: dir.clone(),
            source,
        })?;
        let updates = append_handle(&dir.join(UPDATE_LOG))?;
        let errors = append_handle(&dir.join(ERROR_LOG))?;
        Ok(Self {
            dir,
            updates,
            errors,
        })
    }

    /// Appends one line per transition, connected peers first, and returns
    /// the events in the order they were written. Empty input does no I/O.
    ///
    /// A failed append is recorded to the error channel and then returned
    /// as the tick's error; the caller must learn the audit trail is
    /// incomplete before it notifies anyone.
    pub fn record(&mut self, changes: &PeerChanges) -> Result<Vec<TransitionEvent>, LogError> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }

        let mut events = Vec::with_capacity(changes.connected.len() + changes.disconnected.len());
        for record in &changes.connected {
            events.push(TransitionEvent::now(record, true));
        }
        for record in &changes.disconnected {
            events.push(TransitionEvent::now(record, false));
        }

        for event in &events {
            if let Err(source) = writeln!(self.updates, "{event}") {
                return Err(self.raise(source));
            }
        }
        Ok(events)
    }

    fn raise(&mut self, source: std::io::Error) -> LogError {
        let failure = LogError {
            log: self.dir.join(UPDATE_LOG),
            source,
        };
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(self.errors, "ERROR {failure} - {stamp}");
        failure
    }
}

fn append_handle(path: &Path) -> Result<File, LogError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogError {
            log: path.to_path_buf(),
            source,
        })
}
