//! SQLite cache backend.
//!
//! One table, `responses`, keyed by resource identifier with the expiry
//! stored as Unix milliseconds so sweeps are a single indexed DELETE.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use studbook_core::error::CacheError;
use studbook_core::{CacheEntry, CacheStore};
use tracing::{debug, info};

/// A persistent SQLite response cache.
pub struct SqliteCache {
    pool: SqlitePool,
}

impl SqliteCache {
    /// Open (or create) a cache database at `path`.
    ///
    /// Pass `":memory:"` for an in-process ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| CacheError::Unavailable(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| CacheError::Unavailable(format!("Failed to open SQLite: {e}")))?;

        let cache = Self { pool };
        cache.run_migrations().await?;
        info!("SQLite cache initialized at {path}");
        Ok(cache)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, CacheError> {
        let cache = Self { pool };
        cache.run_migrations().await?;
        Ok(cache)
    }

    async fn run_migrations(&self) -> Result<(), CacheError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS responses (
                key        TEXT PRIMARY KEY NOT NULL,
                body       TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| CacheError::Unavailable(format!("responses table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_responses_expires_at ON responses(expires_at)")
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError::Unavailable(format!("expires_at index: {e}")))?;

        debug!("SQLite cache migrations complete");
        Ok(())
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<CacheEntry, CacheError> {
        let key: String = row
            .try_get("key")
            .map_err(|e| CacheError::QueryFailed(format!("key column: {e}")))?;
        let body: String = row
            .try_get("body")
            .map_err(|e| CacheError::QueryFailed(format!("body column: {e}")))?;
        let expires_ms: i64 = row
            .try_get("expires_at")
            .map_err(|e| CacheError::QueryFailed(format!("expires_at column: {e}")))?;

        // An unreadable timestamp is treated as already expired.
        let expires_at = Utc
            .timestamp_millis_opt(expires_ms)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        Ok(CacheEntry {
            key,
            body,
            expires_at,
        })
    }
}

#[async_trait]
impl CacheStore for SqliteCache {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let row = sqlx::query("SELECT key, body, expires_at FROM responses WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CacheError::QueryFailed(format!("SELECT failed: {e}")))?;

        row.as_ref().map(Self::row_to_entry).transpose()
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), CacheError> {
        sqlx::query(
            r#"
            INSERT INTO responses (key, body, expires_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                body = excluded.body,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(&entry.key)
        .bind(&entry.body)
        .bind(entry.expires_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| CacheError::Storage(format!("INSERT failed: {e}")))?;

        debug!(key = %entry.key, "Cached response");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let result = sqlx::query("DELETE FROM responses WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError::Storage(format!("DELETE failed: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, CacheError> {
        let result = sqlx::query("DELETE FROM responses WHERE expires_at <= ?1")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError::Storage(format!("Sweep failed: {e}")))?;
        Ok(result.rows_affected() as usize)
    }

    async fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        let rows = sqlx::query("SELECT key, body, expires_at FROM responses ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CacheError::QueryFailed(format!("Scan failed: {e}")))?;
        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn count(&self) -> Result<usize, CacheError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM responses")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CacheError::QueryFailed(format!("COUNT failed: {e}")))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| CacheError::QueryFailed(format!("count column: {e}")))?;
        Ok(n as usize)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        sqlx::query("DROP TABLE IF EXISTS responses")
            .execute(&self.pool)
            .await
            .map_err(|e| CacheError::Storage(format!("DROP failed: {e}")))?;
        self.run_migrations().await
    }
}
