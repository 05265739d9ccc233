// src/store/mod.rs
//! Persistence collaborator interface. The real relational backend lives
//! outside this crate; the pipeline only sees the `Storage` trait. An
//! in-memory implementation is provided for local runs and tests.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enrich::{Difficulty, Enrichment};

/// Source kind tag for syndicated RSS/Atom feeds.
pub const KIND_FEED: &str = "feed";
/// Source kind tag for single web pages scraped for metadata.
pub const KIND_PAGE: &str = "page";

/// Setting key governing how many collection runs happen per day.
pub const SETTING_RUNS_PER_DAY: &str = "collector_runs_per_day";

/// A configured origin the pipeline polls. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentSource {
    pub id: i64,
    pub name: String,
    /// Source-type string: [`KIND_FEED`] or [`KIND_PAGE`]; anything else is
    /// rejected per-source at collection time.
    pub kind: String,
    pub url: String,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One piece of content discovered from a source. The AI fields and
/// `processed_by_ai` are the only mutable surface, written once by the
/// enrichment pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub description: String,
    /// Globally unique among items; the natural dedup key.
    pub url: String,
    pub image_url: String,
    pub published_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    pub ai_summary: Option<String>,
    pub ai_tags: Vec<String>,
    pub ai_difficulty: Option<Difficulty>,
    pub processed_by_ai: bool,
}

/// Insert payload for a first-sighted item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContentItem {
    pub source_id: i64,
    pub title: String,
    pub description: String,
    pub url: String,
    pub image_url: String,
    pub published_at: DateTime<Utc>,
}

/// The small persistence surface the pipeline orchestrates against.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn list_sources(&self) -> Result<Vec<ContentSource>>;

    /// Create-if-absent keyed by url. Returns `true` when a new row was
    /// inserted, `false` when the url was already known. A duplicate is
    /// never an error.
    async fn create_item_if_absent(&self, item: NewContentItem) -> Result<bool>;

    async fn list_unprocessed_items(&self, limit: usize) -> Result<Vec<ContentItem>>;

    /// Write AI fields and flip `processed_by_ai` for one item.
    async fn update_item_enrichment(&self, item_id: i64, enrichment: &Enrichment) -> Result<()>;

    async fn get_setting(&self, key: &str) -> Result<Option<String>>;

    /// Create-or-replace a setting value. No deletion path exists.
    async fn upsert_setting(&self, key: &str, value: &str) -> Result<()>;
}
