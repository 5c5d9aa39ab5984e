//! Multi-subject catalog runs.
//!
//! A run guards against platforms it cannot render on, takes the run lock,
//! lays out subjects a few at a time, writes the pages into one PDF in
//! request order and folds its duration into the telemetry record.

use crate::page::{PageOptions, RenderedPage, generate_page};
use crate::run_lock::RunLock;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use studbook_core::error::{CatalogError, Error};
use studbook_core::{HorseId, HorseRecords};
use studbook_layout::PdfBook;
use studbook_telemetry::{RunTelemetry, TelemetryStore};
use tracing::{info, warn};

/// Subjects laid out concurrently per batch.
const SUBJECT_BATCH: usize = 3;

/// How hip numbers are assigned to the requested subjects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HipNumbers {
    #[default]
    None,
    /// 1, 2, 3, ...
    Auto,
    /// `start`, `start + 1`, ...
    Sequential { start: u32 },
    /// One entry per subject; `None` prints no hip.
    Explicit(Vec<Option<String>>),
}

impl HipNumbers {
    pub fn resolve(&self, subjects: usize) -> Result<Vec<Option<String>>, CatalogError> {
        match self {
            Self::None => Ok(vec![None; subjects]),
            Self::Auto => Ok((1..=subjects).map(|n| Some(n.to_string())).collect()),
            Self::Sequential { start } => Ok((0..subjects)
                .map(|i| Some((u64::from(*start) + i as u64).to_string()))
                .collect()),
            Self::Explicit(hips) if hips.len() == subjects => Ok(hips.clone()),
            Self::Explicit(hips) => Err(CatalogError::HipCountMismatch {
                hips: hips.len(),
                subjects,
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogRequest {
    pub subjects: Vec<HorseId>,
    pub hips: HipNumbers,
    /// Overrides the configured broodmare expansion.
    pub full_pedigree: Option<bool>,
}

impl CatalogRequest {
    pub fn new(subjects: Vec<HorseId>) -> Self {
        Self {
            subjects,
            ..Self::default()
        }
    }

    pub fn with_hips(mut self, hips: HipNumbers) -> Self {
        self.hips = hips;
        self
    }

    pub fn with_full_pedigree(mut self, full: bool) -> Self {
        self.full_pedigree = Some(full);
        self
    }
}

/// A finished catalog.
#[derive(Debug, Clone)]
pub struct CatalogDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub pages: usize,
    pub elapsed: Duration,
}

pub struct Catalog {
    records: Arc<dyn HorseRecords>,
    options: PageOptions,
    lock: RunLock,
    telemetry: Option<Arc<TelemetryStore>>,
    watermark: Option<Vec<u8>>,
}

impl Catalog {
    pub fn new(records: Arc<dyn HorseRecords>, options: PageOptions) -> Self {
        Self {
            records,
            options,
            lock: RunLock::new(),
            telemetry: None,
            watermark: None,
        }
    }

    /// Share a lock between catalogs (or processes, with a marker file).
    pub fn with_lock(mut self, lock: RunLock) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_telemetry(mut self, store: Arc<TelemetryStore>) -> Self {
        self.telemetry = Some(store);
        self
    }

    /// PNG or JPEG bytes stamped under every page.
    pub fn with_watermark(mut self, image: Vec<u8>) -> Self {
        self.watermark = Some(image);
        self
    }

    pub fn lock(&self) -> &RunLock {
        &self.lock
    }

    /// Expected duration of a `pages`-page run, from past runs.
    pub async fn estimate(&self, pages: u64) -> Option<Duration> {
        let store = self.telemetry.as_ref()?;
        match store.load().await {
            Ok(record) => record.estimate(pages),
            Err(e) => {
                warn!(error = %e, "Telemetry unavailable");
                None
            }
        }
    }

    pub async fn generate(&self, request: &CatalogRequest) -> Result<CatalogDocument, Error> {
        ensure_supported_platform()?;
        if request.subjects.is_empty() {
            return Err(CatalogError::NoSubjects.into());
        }
        let hips = request.hips.resolve(request.subjects.len())?;
        let _guard = self.lock.try_acquire()?;

        let started = Instant::now();
        let mut options = self.options.clone();
        if let Some(full) = request.full_pedigree {
            options.full_pedigree = full;
        }
        info!(subjects = request.subjects.len(), full_pedigree = options.full_pedigree, "Catalog run started");

        let jobs: Vec<(HorseId, Option<String>)> = request.subjects.iter().copied().zip(hips).collect();
        let mut pages = Vec::with_capacity(jobs.len());
        for batch in jobs.chunks(SUBJECT_BATCH) {
            let results = join_all(batch.iter().map(|(id, hip)| {
                generate_page(self.records.as_ref(), *id, hip.as_deref(), &options)
            }))
            .await;
            for result in results {
                pages.push(result?);
            }
        }

        let bytes = self.render_document(&pages)?;
        let elapsed = started.elapsed();
        self.record_telemetry(elapsed, pages.len()).await;

        let filename = suggested_filename(&pages);
        info!(
            pages = pages.len(),
            bytes = bytes.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            filename = %filename,
            "Catalog run finished"
        );
        Ok(CatalogDocument {
            bytes,
            filename,
            pages: pages.len(),
            elapsed,
        })
    }

    fn render_document(&self, pages: &[RenderedPage]) -> Result<Vec<u8>, Error> {
        let render = |e: studbook_layout::RenderError| Error::from(CatalogError::Render(e.to_string()));
        let mut book = PdfBook::new("Sale Catalog", self.options.geometry).map_err(render)?;
        if let Some(image) = &self.watermark {
            book.set_watermark(image).map_err(render)?;
        }
        for page in pages {
            book.add_page(&page.page);
        }
        book.to_bytes().map_err(render)
    }

    async fn record_telemetry(&self, elapsed: Duration, pages: usize) -> Option<RunTelemetry> {
        let store = self.telemetry.as_ref()?;
        match store.record_run(elapsed, pages as u64).await {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Failed to record run telemetry");
                None
            }
        }
    }
}

/// Catalog rendering is unavailable on wasm targets.
fn ensure_supported_platform() -> Result<(), CatalogError> {
    if cfg!(target_family = "wasm") {
        return Err(CatalogError::Unsupported(std::env::consts::ARCH.to_string()));
    }
    Ok(())
}

/// `{name}.pdf` for a single subject, `catalog-{n}-horses.pdf` otherwise.
pub fn suggested_filename(pages: &[RenderedPage]) -> String {
    match pages {
        [only] => format!("{}.pdf", sanitize(&only.name)),
        _ => format!("catalog-{}-horses.pdf", pages.len()),
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let trimmed = cleaned.trim_matches('-');
    if trimmed.is_empty() { "catalog".into() } else { trimmed.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FixtureRegistry;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use studbook_core::error::FetchError;
    use studbook_core::lineage::LINEAGE_LEN;
    use studbook_core::{HorseProfile, HorseRef, LineageEntry, Progeny, RaceList};
    use studbook_layout::RecordedPage;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    fn lineage(offset: u64) -> Vec<HorseRef> {
        (0..LINEAGE_LEN as u64)
            .map(|i| HorseRef::new(offset + i, format!("Horse {}", offset + i)))
            .collect()
    }

    fn options() -> PageOptions {
        PageOptions {
            today: NaiveDate::from_ymd_opt(2026, 10, 16),
            ..PageOptions::default()
        }
    }

    fn registry() -> FixtureRegistry {
        let mut registry = FixtureRegistry::from_lineage(1, &lineage(100));
        for id in 2..=5 {
            registry.insert_profile(FixtureRegistry::profile_for(
                id,
                &format!("Yearling {id}"),
                studbook_core::Gender::Filly,
                1,
            ));
        }
        registry
    }

    fn page(name: &str) -> RenderedPage {
        RenderedPage {
            subject_id: 1,
            name: name.into(),
            page: RecordedPage::new(),
            kept: 0,
            dropped: 0,
        }
    }

    /// Wraps a registry and parks the first profile request until released.
    struct Gated {
        inner: FixtureRegistry,
        passed: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl HorseRecords for Gated {
        async fn profile(&self, id: HorseId) -> Result<HorseProfile, FetchError> {
            if !self.passed.swap(true, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.profile(id).await
        }
        async fn races(&self, id: HorseId) -> Result<RaceList, FetchError> {
            self.inner.races(id).await
        }
        async fn lineage(&self, id: HorseId) -> Result<Vec<LineageEntry>, FetchError> {
            self.inner.lineage(id).await
        }
        async fn progeny(&self, id: HorseId) -> Result<Vec<Progeny>, FetchError> {
            self.inner.progeny(id).await
        }
    }

    #[test]
    fn hip_numbers_resolve() {
        assert_eq!(HipNumbers::None.resolve(2).unwrap(), vec![None, None]);
        assert_eq!(
            HipNumbers::Auto.resolve(3).unwrap(),
            vec![Some("1".into()), Some("2".into()), Some("3".into())]
        );
        assert_eq!(
            HipNumbers::Sequential { start: 140 }.resolve(2).unwrap(),
            vec![Some("140".into()), Some("141".into())]
        );
        let explicit = HipNumbers::Explicit(vec![Some("7A".into()), None]);
        assert_eq!(explicit.resolve(2).unwrap(), vec![Some("7A".into()), None]);
        assert!(matches!(
            explicit.resolve(3),
            Err(CatalogError::HipCountMismatch { hips: 2, subjects: 3 })
        ));
    }

    #[test]
    fn filenames() {
        assert_eq!(suggested_filename(&[page("Sky Bolt")]), "Sky-Bolt.pdf");
        assert_eq!(suggested_filename(&[page("Sky Bolt"), page("Other")]), "catalog-2-horses.pdf");
        assert_eq!(suggested_filename(&[page("???")]), "catalog.pdf");
    }

    #[tokio::test]
    async fn generates_one_page_per_subject_in_order() {
        let records: Arc<dyn HorseRecords> = Arc::new(registry());
        let telemetry = Arc::new(TelemetryStore::in_memory());
        let catalog = Catalog::new(records, options()).with_telemetry(Arc::clone(&telemetry));

        let request = CatalogRequest::new(vec![1, 2, 3, 4, 5]).with_hips(HipNumbers::Auto);
        let doc = catalog.generate(&request).await.unwrap();
        assert_eq!(doc.pages, 5);
        assert_eq!(doc.filename, "catalog-5-horses.pdf");
        assert!(doc.bytes.starts_with(b"%PDF"));

        let record = telemetry.load().await.unwrap();
        assert_eq!(record.total_runs, 1);
        assert_eq!(record.pages_generated, 5);
        assert!(catalog.estimate(10).await.is_some());
        assert!(!catalog.lock().is_held());
    }

    #[tokio::test]
    async fn empty_request_is_rejected() {
        let catalog = Catalog::new(Arc::new(registry()), options());
        let err = catalog.generate(&CatalogRequest::new(Vec::new())).await.unwrap_err();
        assert!(matches!(err, Error::Catalog(CatalogError::NoSubjects)));
    }

    #[tokio::test]
    async fn failed_run_releases_the_lock() {
        let registry = registry();
        registry.fail_profile(3);
        let catalog = Catalog::new(Arc::new(registry), options());

        let err = catalog.generate(&CatalogRequest::new(vec![1, 3])).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::Status { status_code: 500, .. })));
        assert!(!catalog.lock().is_held());
        assert!(catalog.generate(&CatalogRequest::new(vec![1])).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_requests_are_serialized_by_the_lock() {
        let gated = Arc::new(Gated {
            inner: registry(),
            passed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let records: Arc<dyn HorseRecords> = gated.clone();
        let catalog = Catalog::new(records, options());
        let request = CatalogRequest::new(vec![1]);

        let first = catalog.generate(&request);
        let second = async {
            gated.entered.notified().await;
            let rejected = catalog.generate(&request).await;
            gated.release.notify_one();
            rejected
        };
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(second, Err(Error::Catalog(CatalogError::AlreadyRunning))));
        assert!(first.is_ok());
        let third = catalog.generate(&request).await;
        assert!(third.is_ok());
    }
}
