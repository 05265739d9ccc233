// src/collect/scheduler.rs
//! Long-lived control loop: warm-up delay, one unconditional run, then
//! steady-state runs at an interval recomputed from the runs-per-day
//! setting before every sleep.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::store::{Storage, SETTING_RUNS_PER_DAY};

use super::CollectorService;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    /// Delay between process start and the first collection run.
    pub warmup: Duration,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(5),
        }
    }
}

/// Interval between runs for a raw runs-per-day setting value. Unreadable
/// or non-positive values clamp to 1 run/day.
pub fn interval_from_setting(raw: Option<String>) -> Duration {
    let runs_per_day = raw
        .as_deref()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1);
    Duration::from_secs(24 * 60 * 60 / u64::from(runs_per_day))
}

/// Spawn the scheduler as a background task. The loop has no terminal state
/// of its own; it runs until `cancel` fires, honored at every suspension
/// point so the host can shut down cleanly.
pub fn spawn_collector_scheduler(
    service: Arc<CollectorService>,
    store: Arc<dyn Storage>,
    cfg: SchedulerCfg,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(cfg.warmup) => {}
        }

        info!("running initial content collection");
        run_cycle(&service).await;

        loop {
            let interval = match store.get_setting(SETTING_RUNS_PER_DAY).await {
                Ok(raw) => interval_from_setting(raw),
                Err(e) => {
                    warn!(error = ?e, "failed to read scheduler setting");
                    interval_from_setting(None)
                }
            };
            info!(secs = interval.as_secs(), "next collection scheduled");

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("collector scheduler stopped");
                    return;
                }
                _ = tokio::time::sleep(interval) => {}
            }

            info!("running scheduled content collection");
            run_cycle(&service).await;
        }
    })
}

/// Errors from either sub-call are already isolated per source/item; an
/// enumeration failure aborts the cycle but never unwinds the loop.
async fn run_cycle(service: &CollectorService) {
    if let Err(e) = service.collect_all().await {
        warn!(error = ?e, "collection cycle failed");
    }
    if let Err(e) = service.process_unprocessed_items().await {
        warn!(error = ?e, "enrichment cycle failed");
    }
}
