use std::time::Duration;

use tracing::debug;

/// Exponential backoff between retries of transient provider errors.
/// Doubling, capped delay awaited on the runtime rather than blocking
/// a thread.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    initial: Duration,
    max: Duration,
    max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(8),
            max_attempts: 3,
        }
    }
}

impl BackoffPolicy {
    pub fn new(initial: Duration, max: Duration, max_attempts: u32) -> Self {
        Self { initial, max, max_attempts }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the given attempt (attempt 0 = first retry).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial.saturating_mul(factor).min(self.max)
    }

    /// Await the delay for an attempt. Non-blocking.
    pub async fn wait(&self, attempt: u32) {
        let delay = self.delay_for(attempt);
        debug!(attempt, delay_ms = delay.as_millis() as u64, "Backing off before retry");
        tokio::time::sleep(delay).await;
    }
}
