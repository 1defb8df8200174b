//! Retry policy for the handshake loop.
//!
//! Constant delay with bounded jitter, no exponential growth: a refused or
//! silent server is retried at the same pace forever unless `max_attempts`
//! says otherwise.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::constants::{DEFAULT_RETRY_DELAY, DEFAULT_RETRY_JITTER};

/// Backoff state machine between failed attempts.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before every retry.
    base: Duration,
    /// Upper bound of the uniform jitter added to `base`.
    max_jitter: Duration,
    /// Attempts allowed per failure streak (`u32::MAX` means unbounded).
    max_attempts: u32,
    /// Failed attempts in the current streak.
    current_attempt: u32,
    /// When the current failure streak started.
    started_at: Option<Instant>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_DELAY, DEFAULT_RETRY_JITTER, None)
    }
}

impl BackoffPolicy {
    /// Create a policy. `max_attempts = None` retries forever.
    pub fn new(base: Duration, max_jitter: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            base,
            max_jitter,
            max_attempts: max_attempts.unwrap_or(u32::MAX),
            current_attempt: 0,
            started_at: None,
        }
    }

    /// Fixed delay without jitter.
    pub fn fixed(base: Duration) -> Self {
        Self::new(base, Duration::ZERO, None)
    }

    /// Check if another attempt is allowed.
    pub fn should_retry(&self) -> bool {
        self.current_attempt < self.max_attempts
    }

    /// Record a failed attempt and return how long to wait before the next.
    pub fn next_delay(&mut self) -> Duration {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
        self.current_attempt = self.current_attempt.saturating_add(1);

        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
        } else {
            Duration::ZERO
        };

        self.base + jitter
    }

    /// Failed attempts in the current streak.
    pub fn attempt(&self) -> u32 {
        self.current_attempt
    }

    /// Time since the first failure of the current streak.
    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Forget the failure streak after a successful handshake.
    pub fn reset(&mut self) {
        self.current_attempt = 0;
        self.started_at = None;
    }

    /// Base delay.
    pub fn base(&self) -> Duration {
        self.base
    }

    /// Largest delay [`next_delay`](Self::next_delay) can return.
    pub fn max_delay(&self) -> Duration {
        self.base + self.max_jitter
    }
}
