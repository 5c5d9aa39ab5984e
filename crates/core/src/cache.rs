//! Cache trait: local expiring storage for upstream response bodies.
//!
//! The retrieval client only needs three capabilities (`get`, `put`,
//! `sweep_expired`) plus housekeeping. A backend that cannot be opened is
//! replaced by the no-op implementation rather than checked at every call.

use crate::error::CacheError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Resource identifier, e.g. `horses/42/progeny`.
    pub key: String,

    /// Normalized response body.
    pub body: String,

    /// When the entry stops being served.
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, body: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            body: body.into(),
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// The core CacheStore trait.
///
/// Implementations: SQLite, in-memory (for testing), none (no-op).
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "memory", "none").
    fn name(&self) -> &str;

    /// Fetch an entry by key, expired or not. Expiry is the caller's call.
    async fn get(&self, key: &str) -> std::result::Result<Option<CacheEntry>, CacheError>;

    /// Insert or replace an entry.
    async fn put(&self, entry: CacheEntry) -> std::result::Result<(), CacheError>;

    /// Delete one entry. Returns whether it existed.
    async fn delete(&self, key: &str) -> std::result::Result<bool, CacheError>;

    /// Delete every entry expired at `now`. Returns how many were removed.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> std::result::Result<usize, CacheError>;

    /// All stored entries, for body scans.
    async fn entries(&self) -> std::result::Result<Vec<CacheEntry>, CacheError>;

    /// Number of stored entries.
    async fn count(&self) -> std::result::Result<usize, CacheError>;

    /// Remove everything and start from an empty store.
    async fn clear(&self) -> std::result::Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expiry_is_inclusive() {
        let now = Utc::now();
        let entry = CacheEntry::new("horses/1", "{}", now);
        assert!(entry.is_expired_at(now));
        assert!(!entry.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn entry_serialization() {
        let entry = CacheEntry::new("horses/1", "{\"id\":1}", Utc::now());
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("horses/1"));
    }
}
