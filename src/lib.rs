// src/lib.rs
// Public library surface for integration tests (and the collector binary).

pub mod collect;
pub mod config;
pub mod enrich;
pub mod pacing;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::collect::scheduler::{
    interval_from_setting, spawn_collector_scheduler, SchedulerCfg,
};
pub use crate::collect::CollectorService;
pub use crate::enrich::{Difficulty, Enricher, Enrichment};
pub use crate::pacing::{FixedDelay, NoPacing, Pacer};
pub use crate::store::{memory::MemoryStore, ContentItem, ContentSource, Storage};
