//! Minimum-interval pacing between external calls.
//!
//! The extraction service enforces a global queries-per-minute ceiling, so
//! calls are spaced by a fixed interval. Tracking the last call instant
//! (rather than sleeping a fixed amount after each call) means time spent in
//! the call itself counts toward the interval, and the first call is never
//! delayed.

use std::time::{Duration, Instant};

/// Spaces consecutive external calls at least `interval` apart.
#[derive(Debug)]
pub struct QueryPacer {
    interval: Duration,
    last_call: Option<Instant>,
}

impl QueryPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: None,
        }
    }

    /// Time remaining until the next call may be issued.
    pub fn time_until_ready(&self) -> Duration {
        match self.last_call {
            None => Duration::ZERO,
            Some(last) => self.interval.saturating_sub(last.elapsed()),
        }
    }

    /// Wait until the interval has passed, then mark a call as started.
    pub async fn acquire(&mut self) {
        let wait = self.time_until_ready();
        if wait > Duration::ZERO {
            tracing::debug!("Pacing next query: waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        self.last_call = Some(Instant::now());
    }
}
