//! Content Collection Pipeline — Binary Entrypoint
//! Wires the store, enrichment client, and scheduler loop, then waits for
//! ctrl-c and shuts the loop down through its cancellation token.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use content_collector::collect::scheduler::{spawn_collector_scheduler, SchedulerCfg};
use content_collector::collect::CollectorService;
use content_collector::config::pipeline::PipelineConfig;
use content_collector::config::sources::load_sources_default;
use content_collector::enrich::gemini::GeminiEnricher;
use content_collector::pacing::FixedDelay;
use content_collector::store::memory::MemoryStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("content_collector=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = PipelineConfig::load_or_default("config/pipeline.json");

    let store = Arc::new(MemoryStore::new());
    match load_sources_default() {
        Ok(seeds) => {
            for seed in &seeds {
                store.add_source(&seed.name, &seed.kind, &seed.url);
            }
            info!(sources = seeds.len(), "seeded content sources");
        }
        Err(e) => warn!(error = ?e, "failed to load seed sources"),
    }

    let mut enricher = GeminiEnricher::new(cfg.api_key.clone());
    if let Some(endpoint) = &cfg.endpoint {
        enricher = enricher.with_endpoint(endpoint.clone());
    }

    let pacer = Arc::new(FixedDelay::new(Duration::from_millis(cfg.enrich_pause_ms)));
    let service = Arc::new(
        CollectorService::new(store.clone(), Arc::new(enricher), pacer)
            .with_batch_size(cfg.batch_size),
    );

    let cancel = CancellationToken::new();
    let handle = spawn_collector_scheduler(
        service,
        store,
        SchedulerCfg {
            warmup: Duration::from_secs(cfg.warmup_secs),
        },
        cancel.clone(),
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    cancel.cancel();
    let _ = handle.await;
    Ok(())
}
