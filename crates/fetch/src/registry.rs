//! `HorseRecords` over the upstream registry.
//!
//! Every document goes through [`RetrievalClient::fetch_resource`] with its
//! resource path as the cache key, so the catalog engine never touches the
//! network directly.

use crate::documents::{
    ACCOUNT_KEY, PedigreeDocument, ProgenyDocument, RacePage, pedigree_key, profile_key,
    progeny_key, races_key,
};
use crate::retrieval::RetrievalClient;
use crate::throttle::AbortSignal;
use crate::transport::{HttpTransport, Transport};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use studbook_config::AppConfig;
use studbook_core::error::FetchError;
use studbook_core::{CacheStore, HorseId, HorseProfile, HorseRecords, LineageEntry, Progeny, RaceList};
use tracing::debug;

/// Registry client: resource paths resolved against `base_url`.
pub struct RegistryClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    retrieval: RetrievalClient,
}

impl RegistryClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        retrieval: RetrievalClient,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            retrieval,
        }
    }

    /// HTTP client built from the `upstream`, `cache` and `throttle` sections.
    pub fn from_config(config: &AppConfig, cache: Arc<dyn CacheStore>) -> Result<Self, FetchError> {
        let transport = Arc::new(HttpTransport::new(&config.upstream)?);
        Ok(Self::new(
            config.upstream.base_url.clone(),
            transport,
            RetrievalClient::from_config(cache, config),
        ))
    }

    /// Let `abort` cancel a pending throttle cooldown.
    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.retrieval = self.retrieval.with_abort(abort);
        self
    }

    pub fn retrieval(&self) -> &RetrievalClient {
        &self.retrieval
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url)
    }

    async fn fetch_body(&self, key: &str) -> Result<String, FetchError> {
        let url = self.url(key);
        let transport = Arc::clone(&self.transport);
        self.retrieval
            .fetch_resource(key, move || async move { transport.get(&url).await })
            .await
    }

    async fn fetch_document<T: DeserializeOwned>(&self, key: &str) -> Result<T, FetchError> {
        let body = self.fetch_body(key).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Parse {
            resource: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Signing token from the cache, else from the account document.
    pub async fn signing_token(&self) -> Result<String, FetchError> {
        let url = self.url(ACCOUNT_KEY);
        let transport = Arc::clone(&self.transport);
        self.retrieval
            .signing_token(move || async move { transport.get(&url).await })
            .await
    }
}

#[async_trait]
impl HorseRecords for RegistryClient {
    async fn profile(&self, id: HorseId) -> Result<HorseProfile, FetchError> {
        self.fetch_document(&profile_key(id)).await
    }

    async fn races(&self, id: HorseId) -> Result<RaceList, FetchError> {
        let mut races = RaceList::default();
        // Page numbers come from our own counter, not the echoed `page` field.
        let mut page_number = 1;
        loop {
            let page: RacePage = self.fetch_document(&races_key(id, page_number)).await?;
            let pages = page.pages;
            races.extend(page.races);
            if page_number >= pages {
                break;
            }
            page_number += 1;
        }
        debug!(id, starts = races.len(), pages = page_number, "Race history loaded");
        Ok(races)
    }

    async fn lineage(&self, id: HorseId) -> Result<Vec<LineageEntry>, FetchError> {
        let doc: PedigreeDocument = self.fetch_document(&pedigree_key(id)).await?;
        Ok(doc.ancestors)
    }

    async fn progeny(&self, id: HorseId) -> Result<Vec<Progeny>, FetchError> {
        let doc: ProgenyDocument = self.fetch_document(&progeny_key(id)).await?;
        Ok(doc.progeny)
    }
}
