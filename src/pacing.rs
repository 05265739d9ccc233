// src/pacing.rs
//! Rate throttle seam for the enrichment pass. Injected so the rate budget
//! is testable without real timers. Local state only; running multiple
//! pipeline instances multiplies the effective call rate.

use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait out the configured budget between successive calls.
    async fn pause(&self);
}

/// Fixed pause between calls; not an adaptive backoff.
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Pacer for FixedDelay {
    async fn pause(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// No-op pacing for tests.
pub struct NoPacing;

#[async_trait]
impl Pacer for NoPacing {
    async fn pause(&self) {}
}
