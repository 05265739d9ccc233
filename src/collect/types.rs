// src/collect/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format-neutral representation of one feed entry or scraped page, before
/// persistence. Exists only within a single collection cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentMetadata {
    pub title: String,
    pub description: String,
    pub url: String,
    pub image_url: String,
    pub published_at: DateTime<Utc>,
}
