//! No-op cache: every lookup misses and every write is dropped.
//!
//! Used when caching is disabled (TTL 0, backend `none`) or when the
//! configured backend could not be opened.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use studbook_core::error::CacheError;
use studbook_core::{CacheEntry, CacheStore};

/// A no-op cache that stores nothing.
pub struct NoopCache;

#[async_trait]
impl CacheStore for NoopCache {
    fn name(&self) -> &str { "none" }

    async fn get(&self, _key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(None)
    }

    async fn put(&self, _entry: CacheEntry) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    async fn sweep_expired(&self, _now: DateTime<Utc>) -> Result<usize, CacheError> {
        Ok(0)
    }

    async fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        Ok(Vec::new())
    }

    async fn count(&self) -> Result<usize, CacheError> {
        Ok(0)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
