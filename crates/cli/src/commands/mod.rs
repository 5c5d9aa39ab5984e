pub mod cache;
pub mod config_cmd;
pub mod estimate;
pub mod generate;
pub mod token;

use std::sync::Arc;
use std::time::Duration;
use studbook_config::AppConfig;
use studbook_fetch::{RegistryClient, RetrievalClient};
use studbook_telemetry::TelemetryStore;

/// Registry client over the configured cache backend.
pub async fn registry(config: &AppConfig) -> Result<RegistryClient, Box<dyn std::error::Error>> {
    let cache = studbook_cache::open_cache(&config.cache).await;
    Ok(RegistryClient::from_config(config, cache)?)
}

/// Cache access without an upstream transport.
pub async fn retrieval(config: &AppConfig) -> RetrievalClient {
    let cache = studbook_cache::open_cache(&config.cache).await;
    RetrievalClient::from_config(cache, config)
}

pub fn telemetry(config: &AppConfig) -> Option<Arc<TelemetryStore>> {
    config
        .telemetry
        .enabled
        .then(|| Arc::new(TelemetryStore::file(AppConfig::telemetry_path())))
}

/// `1h 02m 05s`, `3m 10s`, `42s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m:02}m {s:02}s")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_read_naturally() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(190)), "3m 10s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 02m 05s");
    }
}
