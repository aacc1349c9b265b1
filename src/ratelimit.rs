//! Pacing between embedding batches.
//!
//! The indexer pauses through a [`Pacer`] rather than sleeping directly, so
//! tests run instantly and deployments can substitute token buckets or
//! provider-aware backoff without touching indexing logic.

use std::time::Duration;

use async_trait::async_trait;

/// Injectable pause point between consecutive embedding batches.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Fixed-interval pacing, the default for live providers.
pub struct IntervalPacer {
    interval: Duration,
}

impl IntervalPacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

#[async_trait]
impl Pacer for IntervalPacer {
    async fn pause(&self) {
        tokio::time::sleep(self.interval).await;
    }
}

/// No pacing at all; used in tests and against local providers.
#[derive(Default)]
pub struct NoopPacer;

#[async_trait]
impl Pacer for NoopPacer {
    async fn pause(&self) {}
}
