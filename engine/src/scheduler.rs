//! Wall-clock pacing for the refresh loop.

use std::time::Duration;

use acme_types::Ticker;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Fires immediately, then once per `period`. A cycle that overruns delays
/// the next tick instead of bunching missed ones together.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Must be called from within a tokio runtime.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}
