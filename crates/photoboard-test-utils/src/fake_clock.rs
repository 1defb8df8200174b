//! Fake clock for deterministic loop tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use photoboard_core::timing::Clock;

/// Records every requested sleep and returns immediately.
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    /// Sleeps requested so far, ignoring zero-length ones.
    pub fn nonzero_sleeps(&self) -> Vec<Duration> {
        self.sleeps()
            .into_iter()
            .filter(|d| !d.is_zero())
            .collect()
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}
