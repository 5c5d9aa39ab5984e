//! Retrieval client: cache lookup, throttle, network call, normalization,
//! persistence.
//!
//! Cache faults never reach the caller. A failed read is a miss and a failed
//! write is logged; the fetch itself only fails on network, status or abort.

use crate::entities::normalize_body;
use crate::throttle::{AbortSignal, Throttle};
use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use studbook_config::AppConfig;
use studbook_core::error::{CacheError, FetchError};
use studbook_core::{CacheEntry, CacheStore};
use tracing::{debug, info, warn};

static SIGNING_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""signing_token"\s*:\s*"([^"\\]+)""#).expect("signing token pattern")
});

/// Find an embedded signing token in a document body.
pub fn extract_signing_token(body: &str) -> Option<String> {
    SIGNING_TOKEN
        .captures(body)
        .map(|caps| caps[1].to_string())
}

/// Cache occupancy snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub backend: String,
    pub entries: usize,
    pub expired: usize,
}

/// Cache-backed, throttled document fetcher.
pub struct RetrievalClient {
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
    throttle: Throttle,
    abort: AbortSignal,
}

impl RetrievalClient {
    pub fn new(cache: Arc<dyn CacheStore>, ttl: Duration, throttle: Throttle) -> Self {
        Self {
            cache,
            ttl,
            throttle,
            abort: AbortSignal::never(),
        }
    }

    /// Client configured from the `cache` and `throttle` sections.
    pub fn from_config(cache: Arc<dyn CacheStore>, config: &AppConfig) -> Self {
        Self::new(
            cache,
            Duration::from_secs(config.cache.ttl_secs),
            Throttle::from_config(&config.throttle),
        )
    }

    /// Signal that cancels throttle cooldowns.
    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    pub fn cache_backend(&self) -> &str {
        self.cache.name()
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Return the body stored under `key`, or produce it with `generator`.
    ///
    /// A fresh cache entry short-circuits the throttle. On a miss the
    /// throttle is applied, the generator runs, the body is normalized and,
    /// when the TTL is positive, persisted until `now + ttl`.
    pub async fn fetch_resource<F, Fut>(&self, key: &str, generator: F) -> Result<String, FetchError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<String, FetchError>> + Send,
    {
        match self.cache.get(key).await {
            Ok(Some(entry)) if !entry.is_expired_at(Utc::now()) => {
                debug!(key, "Cache hit");
                return Ok(entry.body);
            }
            Ok(Some(_)) => {
                debug!(key, "Cache entry expired");
                if let Err(e) = self.cache.delete(key).await {
                    warn!(key, error = %e, "Failed to evict expired cache entry");
                }
            }
            Ok(None) => debug!(key, "Cache miss"),
            Err(e) => warn!(key, error = %e, "Cache read failed, fetching directly"),
        }

        self.throttle.wait_turn(&self.abort).await?;
        let fetched = generator().await;
        self.throttle.record().await;

        let body = normalize_body(&fetched?);
        if !self.ttl.is_zero() {
            self.persist(key, &body).await;
        }
        Ok(body)
    }

    async fn persist(&self, key: &str, body: &str) {
        let expires_at = match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => Utc::now() + ttl,
            Err(_) => chrono::DateTime::<Utc>::MAX_UTC,
        };
        if let Err(e) = self.cache.put(CacheEntry::new(key, body, expires_at)).await {
            warn!(key, error = %e, "Failed to cache response");
        }
    }

    /// Delete every expired entry. Returns how many were removed.
    pub async fn prune_expired(&self) -> Result<usize, CacheError> {
        let removed = self.cache.sweep_expired(Utc::now()).await?;
        info!(removed, backend = self.cache.name(), "Pruned expired cache entries");
        Ok(removed)
    }

    /// Empty the store.
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.cache.clear().await?;
        info!(backend = self.cache.name(), "Cache cleared");
        Ok(())
    }

    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let now = Utc::now();
        let entries = self.cache.entries().await?;
        Ok(CacheStats {
            backend: self.cache.name().to_string(),
            expired: entries.iter().filter(|e| e.is_expired_at(now)).count(),
            entries: entries.len(),
        })
    }

    /// Signing token embedded in a cached body, else in the document the
    /// `fallback` generator fetches (throttled, never cached).
    pub async fn signing_token<F, Fut>(&self, fallback: F) -> Result<String, FetchError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<String, FetchError>> + Send,
    {
        match self.cache.entries().await {
            Ok(entries) => {
                let now = Utc::now();
                if let Some(token) = entries
                    .iter()
                    .filter(|e| !e.is_expired_at(now))
                    .find_map(|e| extract_signing_token(&e.body))
                {
                    debug!("Signing token found in cache");
                    return Ok(token);
                }
            }
            Err(e) => warn!(error = %e, "Cache scan failed, fetching account page"),
        }

        self.throttle.wait_turn(&self.abort).await?;
        let page = fallback().await;
        self.throttle.record().await;
        extract_signing_token(&page?).ok_or(FetchError::TokenNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use studbook_cache::{InMemoryCache, NoopCache};

    fn client(cache: Arc<dyn CacheStore>, ttl_secs: u64) -> RetrievalClient {
        RetrievalClient::new(
            cache,
            Duration::from_secs(ttl_secs),
            Throttle::new(15, Duration::from_secs(15), Duration::from_secs(60)),
        )
    }

    async fn counted(calls: &AtomicUsize, body: &str) -> Result<String, FetchError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(body.to_string())
    }

    /// A store whose every operation fails.
    struct BrokenCache;

    #[async_trait]
    impl CacheStore for BrokenCache {
        fn name(&self) -> &str {
            "broken"
        }
        async fn get(&self, _key: &str) -> Result<Option<CacheEntry>, CacheError> {
            Err(CacheError::QueryFailed("disk gone".into()))
        }
        async fn put(&self, _entry: CacheEntry) -> Result<(), CacheError> {
            Err(CacheError::Storage("disk gone".into()))
        }
        async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
            Err(CacheError::Storage("disk gone".into()))
        }
        async fn sweep_expired(&self, _now: DateTime<Utc>) -> Result<usize, CacheError> {
            Err(CacheError::Storage("disk gone".into()))
        }
        async fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
            Err(CacheError::QueryFailed("disk gone".into()))
        }
        async fn count(&self) -> Result<usize, CacheError> {
            Err(CacheError::QueryFailed("disk gone".into()))
        }
        async fn clear(&self) -> Result<(), CacheError> {
            Err(CacheError::Storage("disk gone".into()))
        }
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let client = client(Arc::new(InMemoryCache::new()), 3600);
        let calls = AtomicUsize::new(0);

        let first = client
            .fetch_resource("horses/1", || counted(&calls, r#"{"id":1}"#))
            .await
            .unwrap();
        let second = client
            .fetch_resource("horses/1", || counted(&calls, r#"{"id":2}"#))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.throttle().request_count().await, 1);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let cache = Arc::new(InMemoryCache::new());
        cache
            .put(CacheEntry::new("horses/1", "stale", Utc::now() - chrono::Duration::seconds(1)))
            .await
            .unwrap();
        let client = client(cache.clone(), 3600);
        let calls = AtomicUsize::new(0);

        let body = client
            .fetch_resource("horses/1", || counted(&calls, "fresh"))
            .await
            .unwrap();
        assert_eq!(body, "fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("horses/1").await.unwrap().unwrap().body, "fresh");
    }

    #[tokio::test]
    async fn zero_ttl_never_persists() {
        let cache = Arc::new(InMemoryCache::new());
        let client = client(cache.clone(), 0);
        let calls = AtomicUsize::new(0);

        client.fetch_resource("k", || counted(&calls, "a")).await.unwrap();
        client.fetch_resource("k", || counted(&calls, "a")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn broken_cache_degrades_to_direct_fetch() {
        let client = client(Arc::new(BrokenCache), 3600);
        let calls = AtomicUsize::new(0);
        let body = client
            .fetch_resource("k", || counted(&calls, "body"))
            .await
            .unwrap();
        assert_eq!(body, "body");
        client.fetch_resource("k", || counted(&calls, "body")).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn status_error_is_not_cached() {
        let cache = Arc::new(InMemoryCache::new());
        let client = client(cache.clone(), 3600);
        let result = client
            .fetch_resource("horses/404", || async {
                Err(FetchError::Status {
                    status_code: 404,
                    url: "https://registry.test/horses/404".into(),
                })
            })
            .await;
        assert!(matches!(result, Err(FetchError::Status { status_code: 404, .. })));
        assert_eq!(cache.count().await.unwrap(), 0);
        assert_eq!(client.throttle().request_count().await, 1);
    }

    #[tokio::test]
    async fn bodies_are_normalized_before_caching() {
        let cache = Arc::new(InMemoryCache::new());
        let client = client(cache.clone(), 3600);
        let body = client
            .fetch_resource("horses/5", || async {
                Ok(r#"{"name":"Salt &amp; Pepper"}"#.to_string())
            })
            .await
            .unwrap();
        assert!(body.contains("Salt & Pepper"));
        assert!(cache.get("horses/5").await.unwrap().unwrap().body.contains("Salt & Pepper"));
    }

    #[tokio::test]
    async fn signing_token_prefers_cache() {
        let cache = Arc::new(InMemoryCache::new());
        cache
            .put(CacheEntry::new(
                "account",
                r#"{"user":"x","signing_token": "abc123"}"#,
                Utc::now() + chrono::Duration::hours(1),
            ))
            .await
            .unwrap();
        let client = client(cache, 3600);
        let calls = AtomicUsize::new(0);
        let token = client
            .signing_token(|| counted(&calls, ""))
            .await
            .unwrap();
        assert_eq!(token, "abc123");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn signing_token_falls_back_to_account_page() {
        let client = client(Arc::new(NoopCache), 3600);
        let calls = AtomicUsize::new(0);
        let token = client
            .signing_token(|| counted(&calls, r#"<script>{"signing_token":"zz9"}</script>"#))
            .await
            .unwrap();
        assert_eq!(token, "zz9");

        let missing = client.signing_token(|| counted(&calls, "<html></html>")).await;
        assert!(matches!(missing, Err(FetchError::TokenNotFound)));
    }

    #[tokio::test]
    async fn prune_and_stats() {
        let cache = Arc::new(InMemoryCache::new());
        let now = Utc::now();
        cache.put(CacheEntry::new("a", "1", now - chrono::Duration::minutes(1))).await.unwrap();
        cache.put(CacheEntry::new("b", "2", now + chrono::Duration::minutes(1))).await.unwrap();
        let client = client(cache, 3600);

        let stats = client.stats().await.unwrap();
        assert_eq!((stats.entries, stats.expired), (2, 1));
        assert_eq!(client.prune_expired().await.unwrap(), 1);
        client.clear().await.unwrap();
        assert_eq!(client.stats().await.unwrap().entries, 0);
    }
}
