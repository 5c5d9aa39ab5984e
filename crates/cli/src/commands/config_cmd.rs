//! `studbook config`: configuration inspection.

use studbook_config::AppConfig;

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    println!(
        "# {}",
        AppConfig::config_dir().join("config.toml").display()
    );
    println!("{}", config.to_toml());
    Ok(())
}

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();
            if config.upstream.session_cookie.is_none() {
                warnings.push("No session cookie set (set STUDBOOK_SESSION_COOKIE)");
            }
            if config.cache.backend == "none" {
                warnings.push("Caching disabled; every run refetches every document");
            }
            if let Some(path) = &config.catalog.watermark_path {
                if !path.exists() {
                    warnings.push("catalog.watermark_path does not exist");
                }
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Upstream:  {}", config.upstream.base_url);
            println!("   Cache:     {} ({}s TTL)", config.cache.backend, config.cache.ttl_secs);
            println!(
                "   Throttle:  {} requests, then {}s pause",
                config.throttle.batch_size, config.throttle.cooldown_secs
            );
            println!("   Telemetry: {}", if config.telemetry.enabled { "on" } else { "off" });
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}
