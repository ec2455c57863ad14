//! Fixed-interval pacing between consecutive API requests

use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Keeps sequential requests at least `min_interval` apart.
///
/// Not adaptive: no retry, no backoff.
#[derive(Debug)]
pub struct RateGovernor {
    min_interval: Duration,
    last_completed: Option<Instant>,
}

impl RateGovernor {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_completed: None,
        }
    }

    /// Note that a gated request just finished
    pub fn record(&mut self) {
        self.last_completed = Some(Instant::now());
    }

    /// Suspend until `min_interval` has passed since the last recorded request.
    /// Returns immediately if nothing was recorded yet.
    pub async fn wait(&self) {
        if let Some(last) = self.last_completed {
            sleep_until(last + self.min_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_wait_does_not_sleep() {
        let governor = RateGovernor::new(Duration::from_millis(600));
        let start = Instant::now();
        governor.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_covers_remaining_interval() {
        let mut governor = RateGovernor::new(Duration::from_millis(600));
        governor.record();

        tokio::time::advance(Duration::from_millis(200)).await;
        let before = Instant::now();
        governor.wait().await;
        assert_eq!(before.elapsed(), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_after_interval_is_immediate() {
        let mut governor = RateGovernor::new(Duration::from_millis(600));
        governor.record();

        tokio::time::advance(Duration::from_secs(2)).await;
        let before = Instant::now();
        governor.wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
