//! Upstream retrieval for Studbook.
//!
//! Layers, bottom up:
//! - [`Transport`]: a single GET, HTTP in production.
//! - [`Throttle`]: batch/cooldown politeness with an abortable wait.
//! - [`RetrievalClient`]: cache lookup, throttle, fetch, normalize, persist.
//! - [`RegistryClient`]: the four registry documents as [`studbook_core::HorseRecords`].

pub mod documents;
pub mod entities;
pub mod registry;
pub mod retrieval;
pub mod throttle;
pub mod transport;

pub use registry::RegistryClient;
pub use retrieval::{CacheStats, RetrievalClient};
pub use throttle::{AbortHandle, AbortSignal, Throttle};
pub use transport::{HttpTransport, Transport};
