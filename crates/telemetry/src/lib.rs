//! Run-duration telemetry for Studbook.
//!
//! Keeps running totals of catalog runs (count, wall time, pages) so the CLI
//! can estimate how long the next catalog will take.

pub mod record;
pub mod store;

pub use record::RunTelemetry;
pub use store::TelemetryStore;

/// Errors from the telemetry subsystem.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("telemetry I/O error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
