//! # Studbook Catalog
//!
//! Turns registry records into sale-catalog pages: genealogy aggregation
//! over the lineage array, the prioritized dam-line narrative, page-fit
//! pruning, and multi-subject catalog runs guarded by a run lock.

pub mod ancestry;
pub mod catalog;
pub mod narrative;
pub mod page;
pub mod pedigree;
pub mod priority;
pub mod prune;
pub mod run_lock;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use ancestry::{Aggregator, BroodmareProduce};
pub use catalog::{Catalog, CatalogDocument, CatalogRequest, HipNumbers, suggested_filename};
pub use narrative::{NarrativeInput, birth_season, build_narrative, foal_priority};
pub use page::{PageOptions, RenderedPage, generate_page};
pub use priority::{PrioritizedParagraph, Priority, Role};
pub use prune::{prune, total_height};
pub use run_lock::{RunGuard, RunLock};
