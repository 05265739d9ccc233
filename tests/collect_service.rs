// tests/collect_service.rs
//! Batch semantics of the collection service: per-source isolation, url
//! dedup, and the enrichment pass skipping failed items.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use content_collector::collect::CollectorService;
use content_collector::enrich::{Difficulty, Enricher, Enrichment};
use content_collector::pacing::NoPacing;
use content_collector::store::memory::MemoryStore;
use content_collector::store::{NewContentItem, Storage, KIND_FEED, KIND_PAGE};

const BLOG_RSS: &str = include_str!("fixtures/blog_rss.xml");

/// Succeeds with a canned result except for titles listed as poison.
struct ScriptedEnricher {
    poison_title: &'static str,
    calls: AtomicUsize,
}

impl ScriptedEnricher {
    fn new(poison_title: &'static str) -> Self {
        Self {
            poison_title,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Enricher for ScriptedEnricher {
    async fn enrich(&self, title: &str, _description: &str) -> Result<Enrichment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if title == self.poison_title {
            bail!("backend rejected this item");
        }
        Ok(Enrichment {
            summary: format!("Summary of {title}."),
            tags: vec!["Rust".into(), "Testing".into(), "Pipelines".into()],
            difficulty: Difficulty::Intermediate,
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn service_with(store: Arc<MemoryStore>, enricher: Arc<dyn Enricher>) -> CollectorService {
    CollectorService::new(store, enricher, Arc::new(NoPacing))
}

#[tokio::test]
async fn one_bad_source_does_not_abort_the_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BLOG_RSS))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    // Unsupported kind sorts first; the feed source must still be collected.
    store.add_source("Broken", "carrier_pigeon", "https://nowhere.example");
    store.add_source("Blog", KIND_FEED, &format!("{}/feed.xml", server.uri()));

    let enricher: Arc<dyn Enricher> = Arc::new(ScriptedEnricher::new(""));
    let service = service_with(store.clone(), enricher);

    service.collect_all().await.expect("batch survives one bad source");
    assert_eq!(store.item_count(), 3);
}

#[tokio::test]
async fn repeated_collection_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BLOG_RSS))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.add_source("Blog", KIND_FEED, &format!("{}/feed.xml", server.uri()));

    let enricher: Arc<dyn Enricher> = Arc::new(ScriptedEnricher::new(""));
    let service = service_with(store.clone(), enricher);

    service.collect_all().await.unwrap();
    assert_eq!(store.item_count(), 3);

    // A second sighting of every url is a no-op, not an error.
    service.collect_all().await.unwrap();
    assert_eq!(store.item_count(), 3);
}

#[tokio::test]
async fn page_sources_are_scraped_for_metadata() {
    let server = MockServer::start().await;
    let html = r#"<html><head>
        <title>Fallback</title>
        <meta property="og:title" content="Course Landing Page" />
        <meta property="og:description" content="Learn incrementally" />
        <meta property="og:image" content="https://img.example/cover.png" />
    </head></html>"#;
    Mock::given(method("GET"))
        .and(path("/course"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.add_source("Course", KIND_PAGE, &format!("{}/course", server.uri()));

    let enricher: Arc<dyn Enricher> = Arc::new(ScriptedEnricher::new(""));
    let service = service_with(store.clone(), enricher);

    service.collect_all().await.unwrap();
    let items = store.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Course Landing Page");
    assert_eq!(items[0].description, "Learn incrementally");
    assert_eq!(items[0].image_url, "https://img.example/cover.png");
}

#[tokio::test]
async fn failed_enrichment_skips_only_that_item() {
    let store = Arc::new(MemoryStore::new());
    for i in 1..=5 {
        store
            .create_item_if_absent(NewContentItem {
                source_id: 1,
                title: format!("Item {i}"),
                description: "Desc".into(),
                url: format!("https://blog.example/{i}"),
                image_url: String::new(),
                published_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    let enricher = Arc::new(ScriptedEnricher::new("Item 3"));
    let service = service_with(store.clone(), enricher.clone());

    service.process_unprocessed_items().await.unwrap();
    assert_eq!(enricher.calls.load(Ordering::SeqCst), 5);

    let items = store.items();
    for item in &items {
        if item.title == "Item 3" {
            assert!(!item.processed_by_ai, "failed item must stay unprocessed");
            assert_eq!(item.ai_summary, None);
        } else {
            assert!(item.processed_by_ai, "{} should be enriched", item.title);
            assert_eq!(
                item.ai_summary.as_deref(),
                Some(format!("Summary of {}.", item.title).as_str())
            );
            assert_eq!(item.ai_difficulty, Some(Difficulty::Intermediate));
        }
    }

    // The failed item is offered again on a later pass.
    service.process_unprocessed_items().await.unwrap();
    assert_eq!(enricher.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn batch_size_bounds_one_enrichment_pass() {
    let store = Arc::new(MemoryStore::new());
    for i in 1..=8 {
        store
            .create_item_if_absent(NewContentItem {
                source_id: 1,
                title: format!("Item {i}"),
                description: "Desc".into(),
                url: format!("https://blog.example/{i}"),
                image_url: String::new(),
                published_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    let enricher = Arc::new(ScriptedEnricher::new(""));
    let service = CollectorService::new(store.clone(), enricher.clone(), Arc::new(NoPacing))
        .with_batch_size(5);

    service.process_unprocessed_items().await.unwrap();
    assert_eq!(enricher.calls.load(Ordering::SeqCst), 5);
    assert_eq!(store.items().iter().filter(|it| it.processed_by_ai).count(), 5);
}

#[tokio::test]
async fn feed_fetch_error_is_isolated_to_the_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.add_source("Blog", KIND_FEED, &format!("{}/feed.xml", server.uri()));

    let enricher: Arc<dyn Enricher> = Arc::new(ScriptedEnricher::new(""));
    let service = service_with(store.clone(), enricher);

    // The batch entry point still succeeds; the source is skipped.
    service.collect_all().await.unwrap();
    assert_eq!(store.item_count(), 0);
}
