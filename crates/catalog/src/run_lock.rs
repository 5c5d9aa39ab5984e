//! One catalog run at a time.
//!
//! [`RunLock::try_acquire`] hands out a [`RunGuard`]; dropping the guard
//! releases the lock whichever way the run ends. An optional marker file
//! extends the lock to other processes sharing the same config directory.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use studbook_core::error::CatalogError;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct RunLock {
    active: Arc<AtomicBool>,
    marker: Option<PathBuf>,
}

impl RunLock {
    /// In-process lock only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also hold `path` for the duration of each run.
    pub fn with_marker_file(path: impl Into<PathBuf>) -> Self {
        Self {
            active: Arc::default(),
            marker: Some(path.into()),
        }
    }

    pub fn marker(&self) -> Option<&Path> {
        self.marker.as_deref()
    }

    /// Whether a run currently holds the lock in this process.
    pub fn is_held(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn try_acquire(&self) -> Result<RunGuard, CatalogError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CatalogError::AlreadyRunning);
        }

        let mut owns_marker = false;
        if let Some(path) = &self.marker {
            match create_marker(path) {
                Ok(()) => owns_marker = true,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    self.active.store(false, Ordering::Release);
                    return Err(CatalogError::AlreadyRunning);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Could not create run marker; continuing without it");
                }
            }
        }

        debug!("Run lock acquired");
        Ok(RunGuard {
            active: Arc::clone(&self.active),
            marker: self.marker.clone().filter(|_| owns_marker),
        })
    }

    /// Remove a marker left behind by a crashed process.
    pub fn force_release(&self) -> std::io::Result<bool> {
        let Some(path) = &self.marker else {
            return Ok(false);
        };
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn create_marker(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    writeln!(file, "{}", std::process::id())
}

/// Held for the duration of a run.
#[derive(Debug)]
pub struct RunGuard {
    active: Arc<AtomicBool>,
    marker: Option<PathBuf>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Some(path) = &self.marker {
            if let Err(e) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "Failed to remove run marker");
            }
        }
        self.active.store(false, Ordering::Release);
        debug!("Run lock released");
    }
}
