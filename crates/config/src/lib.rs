//! Configuration loading, validation, and management for Studbook.
//!
//! Loads configuration from `~/.studbook/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.studbook/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upstream registry connection
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Local response cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Request pacing toward the upstream registry
    #[serde(default)]
    pub throttle: ThrottleConfig,

    /// Catalog rendering options
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Run-duration telemetry
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Session cookie sent with every request (authenticated pages).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
}

fn default_base_url() -> String {
    "https://registry.example.com/api".into()
}
fn default_user_agent() -> String {
    concat!("studbook/", env!("CARGO_PKG_VERSION")).into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            session_cookie: None,
        }
    }
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .field("session_cookie", &redact(&self.session_cookie))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// `sqlite`, `memory`, or `none`
    #[serde(default = "default_cache_backend")]
    pub backend: String,

    /// Seconds a response stays fresh; 0 bypasses the cache.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Override for the SQLite file location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

fn default_cache_backend() -> String {
    "sqlite".into()
}
fn default_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            ttl_secs: default_ttl_secs(),
            path: None,
        }
    }
}

impl CacheConfig {
    /// Effective SQLite file path.
    pub fn sqlite_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("cache.sqlite"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Requests per burst before a cooldown.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Cooldown length in seconds.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Idle gap after which the burst counter resets.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_batch_size() -> u32 {
    15
}
fn default_cooldown_secs() -> u64 {
    15
}
fn default_window_secs() -> u64 {
    60
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            cooldown_secs: default_cooldown_secs(),
            window_secs: default_window_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Consignor line printed at the top of every page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consignor: Option<String>,

    /// Expand broodmare foals two extra generations.
    #[serde(default)]
    pub full_pedigree: bool,

    /// PNG or JPEG stamped onto every page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark_path: Option<PathBuf>,

    /// Concurrent lookups per batch (ancestors, foals, subjects).
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Refuse to start while another process holds the run marker.
    #[serde(default = "default_true")]
    pub lock_file: bool,
}

fn default_fetch_concurrency() -> usize {
    3
}
fn default_true() -> bool {
    true
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            consignor: None,
            full_pedigree: false,
            watermark_path: None,
            fetch_concurrency: default_fetch_concurrency(),
            lock_file: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Whether run durations are recorded
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.studbook/config.toml).
    ///
    /// Environment overrides:
    /// - `STUDBOOK_BASE_URL`
    /// - `STUDBOOK_SESSION_COOKIE`
    /// - `STUDBOOK_CACHE_BACKEND`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("STUDBOOK_BASE_URL") {
            self.upstream.base_url = url;
        }
        if let Some(cookie) = lookup("STUDBOOK_SESSION_COOKIE") {
            self.upstream.session_cookie = Some(cookie);
        }
        if let Some(backend) = lookup("STUDBOOK_CACHE_BACKEND") {
            self.cache.backend = backend;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".studbook")
    }

    /// Marker file held while a catalog run is in progress.
    pub fn run_marker_path() -> PathBuf {
        Self::config_dir().join("catalog.lock")
    }

    /// Persisted telemetry record.
    pub fn telemetry_path() -> PathBuf {
        Self::config_dir().join("telemetry.json")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.upstream.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "upstream.base_url must start with http:// or https:// (got {url})"
            )));
        }

        if !matches!(self.cache.backend.as_str(), "sqlite" | "memory" | "none") {
            return Err(ConfigError::ValidationError(format!(
                "cache.backend must be sqlite, memory or none (got {})",
                self.cache.backend
            )));
        }

        if self.throttle.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "throttle.batch_size must be > 0".into(),
            ));
        }

        if self.catalog.fetch_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "catalog.fetch_concurrency must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML (for the `config` command).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        Self::default().to_toml()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
