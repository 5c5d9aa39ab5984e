//! Response cache implementations for Studbook.

pub mod in_memory;
pub mod noop;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::InMemoryCache;
pub use noop::NoopCache;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCache;

use std::sync::Arc;
use studbook_config::CacheConfig;
use studbook_core::CacheStore;
use tracing::warn;

/// Open the configured backend.
///
/// Never fails: a backend that cannot be opened is logged and replaced by
/// [`NoopCache`], which makes every lookup a miss.
pub async fn open_cache(config: &CacheConfig) -> Arc<dyn CacheStore> {
    if config.ttl_secs == 0 {
        return Arc::new(NoopCache);
    }
    match config.backend.as_str() {
        "memory" => Arc::new(InMemoryCache::new()),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = config.sqlite_path();
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!(path = %parent.display(), error = %e, "Cache directory unavailable, caching disabled");
                    return Arc::new(NoopCache);
                }
            }
            match SqliteCache::new(&path.to_string_lossy()).await {
                Ok(cache) => Arc::new(cache),
                Err(e) => {
                    warn!(error = %e, "SQLite cache unavailable, caching disabled");
                    Arc::new(NoopCache)
                }
            }
        }
        other => {
            if other != "none" {
                warn!(backend = other, "Unknown cache backend, caching disabled");
            }
            Arc::new(NoopCache)
        }
    }
}
