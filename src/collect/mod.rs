// src/collect/mod.rs
//! Collection orchestration: per-source fetch -> normalize -> dedup-insert,
//! plus the throttled enrichment batch pass. Both entry points are
//! idempotent and safe to invoke repeatedly.

pub mod feed;
pub mod metadata;
pub mod scheduler;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, ensure, Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use reqwest::StatusCode;
use tracing::{info, warn};

use crate::enrich::Enricher;
use crate::pacing::Pacer;
use crate::store::{ContentSource, NewContentItem, Storage, KIND_FEED, KIND_PAGE};

use types::ContentMetadata;

/// Unprocessed items pulled per enrichment pass; bounds the external rate
/// budget spent in one cycle.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// One-time metrics registration (so series show up on a host exporter).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("collect_events_total", "Entries parsed from feeds and pages.");
        describe_counter!("collect_saved_total", "New items inserted after dedup.");
        describe_counter!("collect_source_errors_total", "Per-source fetch/parse errors.");
        describe_counter!("enrich_ok_total", "Items successfully enriched.");
        describe_counter!("enrich_errors_total", "Failed enrichment calls.");
        describe_histogram!("collect_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("collect_last_run_ts", "Unix ts when collection last ran.");
    });
}

/// Orchestrates collection and enrichment against injected collaborators.
/// No global state; construct one per process and share via `Arc`.
pub struct CollectorService {
    store: Arc<dyn Storage>,
    enricher: Arc<dyn Enricher>,
    pacer: Arc<dyn Pacer>,
    http: reqwest::Client,
    batch_size: usize,
}

impl CollectorService {
    pub fn new(
        store: Arc<dyn Storage>,
        enricher: Arc<dyn Enricher>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        ensure_metrics_described();
        let http = reqwest::Client::builder()
            .user_agent(concat!("content-collector/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()
            .expect("reqwest client");
        Self {
            store,
            enricher,
            pacer,
            http,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Fetch every registered source and insert first-sighted items. One
    /// failing source never aborts the batch; the only propagated failure
    /// is being unable to enumerate sources at all.
    pub async fn collect_all(&self) -> Result<()> {
        let sources = self
            .store
            .list_sources()
            .await
            .context("listing content sources")?;
        info!(sources = sources.len(), "starting content collection");

        for source in &sources {
            match self.collect_source(source).await {
                Ok(saved) => {
                    counter!("collect_saved_total").increment(saved as u64);
                    info!(source = %source.name, saved, "source collected");
                }
                Err(e) => {
                    counter!("collect_source_errors_total").increment(1);
                    warn!(source = %source.name, error = ?e, "source collection failed");
                }
            }
        }

        metrics::gauge!("collect_last_run_ts").set(now_ts());
        Ok(())
    }

    async fn collect_source(&self, source: &ContentSource) -> Result<usize> {
        info!(source = %source.name, url = %source.url, "fetching source");

        let entries = match source.kind.as_str() {
            KIND_FEED => self.fetch_feed(&source.url).await?,
            KIND_PAGE => vec![metadata::fetch_page_metadata(&self.http, &source.url).await?],
            other => bail!("unsupported source kind: {other}"),
        };

        let mut saved = 0usize;
        for meta in entries {
            let item = new_item(source.id, meta);
            match self.store.create_item_if_absent(item).await {
                Ok(true) => saved += 1,
                Ok(false) => {} // url already known; benign
                Err(e) => warn!(source = %source.name, error = ?e, "failed to save item"),
            }
        }
        Ok(saved)
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<ContentMetadata>> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetching feed {url}"))?;
        ensure!(
            resp.status() == StatusCode::OK,
            "feed fetch returned status {} for {url}",
            resp.status()
        );
        let body = resp.bytes().await.context("reading feed body")?;
        feed::parse_feed(&String::from_utf8_lossy(&body))
    }

    /// Enrich a bounded batch of unprocessed items. Per-item failures are
    /// logged and skipped with no within-pass retry; a failed item stays
    /// unprocessed until a later pass.
    pub async fn process_unprocessed_items(&self) -> Result<()> {
        let items = self
            .store
            .list_unprocessed_items(self.batch_size)
            .await
            .context("listing unprocessed items")?;
        if items.is_empty() {
            return Ok(());
        }
        info!(items = items.len(), "enriching items");

        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.pacer.pause().await;
            }
            match self.enricher.enrich(&item.title, &item.description).await {
                Ok(enrichment) => {
                    if let Err(e) = self.store.update_item_enrichment(item.id, &enrichment).await {
                        counter!("enrich_errors_total").increment(1);
                        warn!(item = item.id, error = ?e, "failed to persist enrichment");
                        continue;
                    }
                    counter!("enrich_ok_total").increment(1);
                }
                Err(e) => {
                    counter!("enrich_errors_total").increment(1);
                    warn!(item = item.id, error = ?e, "enrichment failed");
                }
            }
        }
        Ok(())
    }
}

fn new_item(source_id: i64, meta: ContentMetadata) -> NewContentItem {
    NewContentItem {
        source_id,
        title: meta.title,
        description: meta.description,
        url: meta.url,
        image_url: meta.image_url,
        published_at: meta.published_at,
    }
}

fn now_ts() -> f64 {
    chrono::Utc::now().timestamp().max(0) as f64
}
