use std::{fs::OpenOptions, io::Write, sync::Mutex};

use tracing::warn;

use crate::engine::error::NarrationError;
use crate::trace::trace::TraceEvent;

/// Appends [`TraceEvent`]s to a file, one JSON object per line.
pub struct TraceLogger {
    file: Option<Mutex<std::fs::File>>,
}

impl TraceLogger {
    pub fn create(path: &str) -> Result<Self, NarrationError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| NarrationError::Trace {
                path: path.to_string(),
                source,
            })?;

        Ok(Self {
            file: Some(Mutex::new(file)),
        })
    }

    /// Like [`create`](Self::create), but a file that cannot be opened only
    /// disables tracing.
    pub fn open_or_disabled(path: &str) -> Self {
        match Self::create(path) {
            Ok(logger) => logger,
            Err(e) => {
                warn!("{}", e);
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { file: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    pub fn log(&self, event: &TraceEvent) {
        let file_mutex = match &self.file {
            Some(f) => f,
            None => return,
        };

        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                warn!("failed to serialize trace event: {}", e);
                return;
            }
        };

        let mut file = match file_mutex.lock() {
            Ok(f) => f,
            Err(e) => {
                warn!("trace logger lock poisoned: {}", e);
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            warn!("failed to write trace event: {}", e);
        }
    }
}
