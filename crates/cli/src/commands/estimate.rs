//! `studbook estimate`: predicted run time from past runs.

use studbook_config::AppConfig;
use studbook_telemetry::TelemetryStore;

pub async fn run(pages: u64) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    if !config.telemetry.enabled {
        println!("⚠️  Telemetry is disabled; enable [telemetry] to get estimates");
        return Ok(());
    }

    let store = TelemetryStore::file(AppConfig::telemetry_path());
    let record = store.load().await?;

    println!("⏱️  Run Estimate");
    println!("─────────────────────────────");
    match (record.estimate(pages), record.average_per_page()) {
        (Some(estimate), Some(per_page)) => {
            println!("   Pages:        {pages}");
            println!("   Estimate:     {}", super::format_duration(estimate));
            println!("   Per page:     {} ms", per_page.as_millis());
            println!(
                "   Based on:     {} run(s), {} page(s)",
                record.total_runs, record.pages_generated
            );
        }
        _ => println!("   No completed runs yet."),
    }
    Ok(())
}
