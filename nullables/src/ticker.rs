//! Nullable ticker: cycles on demand instead of on a schedule.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use acme_types::Ticker;

/// Ticks immediately, optionally only a fixed number of times. Once the
/// limit is reached `tick` never resolves again.
#[derive(Clone, Debug, Default)]
pub struct NullTicker {
    limit: Option<usize>,
    ticks: Arc<AtomicUsize>,
}

impl NullTicker {
    /// Ticks forever.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks `limit` times, then waits forever.
    pub fn limited(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ticks: Arc::default(),
        }
    }

    /// Ticks delivered so far, across clones.
    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }
}

impl Ticker for NullTicker {
    async fn tick(&mut self) {
        if self.limit.is_some_and(|limit| self.ticks() >= limit) {
            std::future::pending::<()>().await;
        }
        self.ticks.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
    }
}
