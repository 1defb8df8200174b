//! Clock abstraction for the loop's sleeps.
//!
//! Every delay in the handshake loop (retry backoff, action delay, cycle
//! delay) goes through [`Clock::sleep`], so tests can record the requested
//! delays instead of waiting for them.

use std::time::Duration;

use async_trait::async_trait;

/// Source of sleeps.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_advances_time() {
        let start = Instant::now();
        TokioClock.sleep(Duration::from_secs(2)).await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_sleep_returns_immediately() {
        let start = Instant::now();
        TokioClock.sleep(Duration::ZERO).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
