//! `studbook generate`: the catalog run.

use std::path::PathBuf;
use studbook_catalog::{Catalog, CatalogRequest, HipNumbers, PageOptions, RunLock};
use studbook_config::AppConfig;
use studbook_fetch::AbortHandle;
use tracing::warn;

pub struct GenerateArgs {
    pub ids: Vec<u64>,
    pub hips: HipNumbers,
    pub full_pedigree: bool,
    pub output: Option<PathBuf>,
    pub force_unlock: bool,
}

/// Map the mutually exclusive hip flags onto a numbering scheme.
pub fn hip_numbers(start: Option<u32>, auto: bool, explicit: Option<Vec<String>>) -> HipNumbers {
    if let Some(labels) = explicit {
        return HipNumbers::Explicit(
            labels
                .into_iter()
                .map(|label| {
                    let label = label.trim().to_string();
                    (!label.is_empty()).then_some(label)
                })
                .collect(),
        );
    }
    match (start, auto) {
        (Some(start), _) => HipNumbers::Sequential { start },
        (None, true) => HipNumbers::Auto,
        (None, false) => HipNumbers::None,
    }
}

pub async fn run(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let (abort, signal) = AbortHandle::new();
    let registry = super::registry(&config).await?.with_abort(signal);

    let lock = if config.catalog.lock_file {
        RunLock::with_marker_file(AppConfig::run_marker_path())
    } else {
        RunLock::new()
    };
    if args.force_unlock && lock.force_release()? {
        println!("🔓 Removed stale run marker");
    }

    let mut catalog = Catalog::new(
        std::sync::Arc::new(registry),
        PageOptions::from_config(&config.catalog),
    )
    .with_lock(lock);
    if let Some(store) = super::telemetry(&config) {
        catalog = catalog.with_telemetry(store);
    }
    if let Some(path) = &config.catalog.watermark_path {
        match tokio::fs::read(path).await {
            Ok(image) => catalog = catalog.with_watermark(image),
            Err(e) => warn!(path = %path.display(), error = %e, "Watermark unreadable, continuing without it"),
        }
    }

    let pages = args.ids.len() as u64;
    println!("📖 Studbook catalog");
    println!("─────────────────────────────");
    println!("   Horses:   {pages}");
    match catalog.estimate(pages).await {
        Some(estimate) => println!("   Estimate: {}", super::format_duration(estimate)),
        None => println!("   Estimate: no previous runs"),
    }
    println!();

    // Ctrl-C cuts short any throttle cooldown in progress.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping at the next pause");
            abort.abort();
        }
    });

    let mut request = CatalogRequest::new(args.ids).with_hips(args.hips);
    if args.full_pedigree {
        request = request.with_full_pedigree(true);
    }
    let document = catalog.generate(&request).await?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&document.filename));
    tokio::fs::write(&output, &document.bytes).await?;

    println!("✅ {} page(s) written to {}", document.pages, output.display());
    println!("   Took {}", super::format_duration(document.elapsed));
    Ok(())
}
