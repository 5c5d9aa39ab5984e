//! The persisted run-duration record.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Totals across every completed catalog run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunTelemetry {
    pub total_runs: u64,
    pub total_run_time_ms: u64,
    pub pages_generated: u64,
}

impl RunTelemetry {
    /// Whether any run has completed yet.
    pub fn recorded(&self) -> bool {
        self.pages_generated > 0
    }

    /// Mean wall time per page so far.
    pub fn average_per_page(&self) -> Option<Duration> {
        if self.pages_generated == 0 {
            return None;
        }
        Some(Duration::from_millis(self.total_run_time_ms / self.pages_generated))
    }

    /// `pages × total run time / pages generated`.
    pub fn estimate(&self, pages: u64) -> Option<Duration> {
        if self.pages_generated == 0 {
            return None;
        }
        let millis = u128::from(pages) * u128::from(self.total_run_time_ms)
            / u128::from(self.pages_generated);
        Some(Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX)))
    }

    /// Fold one finished run into the totals.
    pub fn add_run(&mut self, elapsed: Duration, pages: u64) {
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.total_runs += 1;
        self.total_run_time_ms = self.total_run_time_ms.saturating_add(millis);
        self.pages_generated += pages;
    }
}
