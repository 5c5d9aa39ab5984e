//! Error types for the Studbook domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Studbook operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Retrieval errors ---
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    // --- Cache errors ---
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    // --- Catalog errors ---
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures while retrieving upstream documents.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request to {url} failed with status {status_code}")]
    Status { status_code: u16, url: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed {resource} document: {reason}")]
    Parse { resource: String, reason: String },

    #[error("Request aborted during throttle cooldown")]
    Aborted,

    #[error("No signing token found")]
    TokenNotFound,
}

/// Faults in the local response cache. These never reach callers of the
/// retrieval client; they are logged and the cache is bypassed.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

/// Failures of a catalog generation run.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Profile id mismatch: requested {requested}, document describes {found}")]
    IdentityMismatch { requested: u64, found: u64 },

    #[error("A catalog is already being generated. Wait for it to finish and try again.")]
    AlreadyRunning,

    #[error("Catalog generation is not supported on this platform: {0}")]
    Unsupported(String),

    #[error("No subjects were requested")]
    NoSubjects,

    #[error("Hip number list has {hips} entries for {subjects} subjects")]
    HipCountMismatch { hips: usize, subjects: usize },

    #[error("Render failed: {0}")]
    Render(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_displays_correctly() {
        let err = Error::Fetch(FetchError::Status {
            status_code: 503,
            url: "https://registry.test/horses/7".into(),
        });
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("/horses/7"));
    }

    #[test]
    fn already_running_is_user_facing() {
        let err = Error::Catalog(CatalogError::AlreadyRunning);
        assert!(err.to_string().contains("already being generated"));
    }

    #[test]
    fn identity_mismatch_names_both_ids() {
        let err = CatalogError::IdentityMismatch {
            requested: 10,
            found: 11,
        };
        let text = err.to_string();
        assert!(text.contains("10"));
        assert!(text.contains("11"));
    }
}
