// src/store/memory.rs
use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;

use crate::enrich::Enrichment;

use super::{ContentItem, ContentSource, NewContentItem, Storage};

/// In-memory `Storage` backed by a mutex-guarded table. Stands in for the
/// relational backend in local runs and tests; locks are never held across
/// an await point.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    sources: Vec<ContentSource>,
    items: Vec<ContentItem>,
    settings: HashMap<String, String>,
    next_source_id: i64,
    next_item_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, assigning it an id. Sources are immutable once
    /// created, so this is the whole admin surface the store needs.
    pub fn add_source(&self, name: &str, kind: &str, url: &str) -> ContentSource {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.next_source_id += 1;
        let source = ContentSource {
            id: inner.next_source_id,
            name: name.to_string(),
            kind: kind.to_string(),
            url: url.to_string(),
            last_fetched_at: None,
            created_at: Utc::now(),
        };
        inner.sources.push(source.clone());
        source
    }

    pub fn item_count(&self) -> usize {
        self.inner.lock().expect("store lock poisoned").items.len()
    }

    /// Snapshot of all items, in insertion order.
    pub fn items(&self) -> Vec<ContentItem> {
        self.inner.lock().expect("store lock poisoned").items.clone()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn list_sources(&self) -> Result<Vec<ContentSource>> {
        Ok(self.inner.lock().expect("store lock poisoned").sources.clone())
    }

    async fn create_item_if_absent(&self, item: NewContentItem) -> Result<bool> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        if inner.items.iter().any(|it| it.url == item.url) {
            return Ok(false);
        }
        inner.next_item_id += 1;
        let id = inner.next_item_id;
        inner.items.push(ContentItem {
            id,
            source_id: item.source_id,
            title: item.title,
            description: item.description,
            url: item.url,
            image_url: item.image_url,
            published_at: item.published_at,
            fetched_at: Utc::now(),
            ai_summary: None,
            ai_tags: Vec::new(),
            ai_difficulty: None,
            processed_by_ai: false,
        });
        Ok(true)
    }

    async fn list_unprocessed_items(&self, limit: usize) -> Result<Vec<ContentItem>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .items
            .iter()
            .filter(|it| !it.processed_by_ai)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_item_enrichment(&self, item_id: i64, enrichment: &Enrichment) -> Result<()> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let Some(item) = inner.items.iter_mut().find(|it| it.id == item_id) else {
            bail!("no item with id {item_id}");
        };
        item.ai_summary = Some(enrichment.summary.clone());
        item.ai_tags = enrichment.tags.clone();
        item.ai_difficulty = Some(enrichment.difficulty);
        item.processed_by_ai = true;
        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.settings.get(key).cloned())
    }

    async fn upsert_setting(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.settings.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
