//! # Studbook Core
//!
//! Domain types, traits, and error definitions for the Studbook sale-catalog
//! generator. This crate performs **no I/O**; it defines the domain model
//! that the retrieval, layout, and catalog crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external seam is a trait here (`HorseRecords` for upstream data,
//! `CacheStore` for the local response cache). Implementations live in their
//! respective crates, so the aggregation engine can be tested against stubs.

pub mod cache;
pub mod error;
pub mod format;
pub mod horse;
pub mod lineage;
pub mod race;
pub mod records;

// Re-export key types at crate root for ergonomics
pub use cache::{CacheEntry, CacheStore};
pub use error::{CacheError, CatalogError, Error, FetchError, Result};
pub use horse::{Ancestor, Gender, HorseId, HorseProfile, HorseRef, Progeny, RecordLine};
pub use lineage::{LineageEntry, GENERATIONS, LINEAGE_LEN};
pub use race::{Gait, LifetimeMark, Race, RaceList, RaceSummary};
pub use records::HorseRecords;
