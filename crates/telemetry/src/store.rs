//! Where the run record lives between runs.
//!
//! The record is read once when a run starts and written once when it
//! finishes. A file that cannot be parsed is treated as empty.

use crate::TelemetryError;
use crate::record::RunTelemetry;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

enum Backend {
    File(PathBuf),
    Memory(Mutex<RunTelemetry>),
}

pub struct TelemetryStore {
    backend: Backend,
}

impl TelemetryStore {
    /// JSON file, usually `~/.studbook/telemetry.json`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::File(path.into()),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(RunTelemetry::default())),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.backend {
            Backend::File(path) => Some(path),
            Backend::Memory(_) => None,
        }
    }

    /// Current totals. Missing or corrupt files read as zero.
    pub async fn load(&self) -> Result<RunTelemetry, TelemetryError> {
        match &self.backend {
            Backend::Memory(record) => Ok(*record.lock().await),
            Backend::File(path) => {
                let text = match tokio::fs::read_to_string(path).await {
                    Ok(text) => text,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        return Ok(RunTelemetry::default());
                    }
                    Err(e) => return Err(TelemetryError::Io(e.to_string())),
                };
                match serde_json::from_str(&text) {
                    Ok(record) => Ok(record),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Corrupt telemetry file, starting from zero");
                        Ok(RunTelemetry::default())
                    }
                }
            }
        }
    }

    /// Add one completed run and persist the new totals.
    pub async fn record_run(&self, elapsed: Duration, pages: u64) -> Result<RunTelemetry, TelemetryError> {
        let updated = match &self.backend {
            Backend::Memory(record) => {
                let mut record = record.lock().await;
                record.add_run(elapsed, pages);
                *record
            }
            Backend::File(path) => {
                let mut record = self.load().await?;
                record.add_run(elapsed, pages);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| TelemetryError::Io(e.to_string()))?;
                }
                let json = serde_json::to_string_pretty(&record)?;
                tokio::fs::write(path, json)
                    .await
                    .map_err(|e| TelemetryError::Io(e.to_string()))?;
                record
            }
        };
        debug!(
            runs = updated.total_runs,
            pages = updated.pages_generated,
            "Telemetry updated"
        );
        Ok(updated)
    }
}
