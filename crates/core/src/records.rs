//! HorseRecords trait: the structured view of the upstream registry.
//!
//! The catalog engine talks to this trait only; the retrieval crate maps it
//! onto cached, throttled HTTP fetches, and tests substitute counting stubs.

use crate::error::FetchError;
use crate::horse::{HorseId, HorseProfile, Progeny};
use crate::lineage::LineageEntry;
use crate::race::RaceList;
use async_trait::async_trait;

#[async_trait]
pub trait HorseRecords: Send + Sync {
    /// Profile document of one horse.
    async fn profile(&self, id: HorseId) -> Result<HorseProfile, FetchError>;

    /// Complete race history (all pages).
    async fn races(&self, id: HorseId) -> Result<RaceList, FetchError>;

    /// Ordered ancestor name/id pairs, sire first.
    async fn lineage(&self, id: HorseId) -> Result<Vec<LineageEntry>, FetchError>;

    /// Every registered foal of a horse.
    async fn progeny(&self, id: HorseId) -> Result<Vec<Progeny>, FetchError>;
}
