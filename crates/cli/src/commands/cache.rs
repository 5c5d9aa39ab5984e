//! `studbook cache`: document cache maintenance.

use studbook_config::AppConfig;

pub async fn stats() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let client = super::retrieval(&config).await;
    let stats = client.stats().await?;

    println!("🗄️  Document Cache");
    println!("─────────────────────────────");
    println!("   Backend:  {}", stats.backend);
    println!("   Entries:  {}", stats.entries);
    println!("   Expired:  {}", stats.expired);
    println!("   TTL:      {}s", config.cache.ttl_secs);
    Ok(())
}

pub async fn prune() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let removed = super::retrieval(&config).await.prune_expired().await?;
    println!("🧹 Removed {removed} expired entr{}", if removed == 1 { "y" } else { "ies" });
    Ok(())
}

pub async fn clear() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let client = super::retrieval(&config).await;
    client.clear().await?;
    println!("🗑️  Cleared the {} cache", client.cache_backend());
    Ok(())
}
