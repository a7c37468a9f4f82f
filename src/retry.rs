use std::{fmt::Display, future::Future, time::Duration};

use rand::Rng;
use tracing::debug;

/// Retry policy with exponential backoff and jitter, passed explicitly to
/// every outbound call that wants it.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Upper bound of the sleep after the given failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << shift)
    }

    pub async fn run<F, Fut, T, E>(&self, what: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(e) => {
                    let ceiling = self.backoff(attempt).as_millis() as u64;
                    let delay = if ceiling == 0 {
                        0
                    } else {
                        rand::thread_rng().gen_range(ceiling / 2..=ceiling)
                    };
                    debug!(what, attempt, delay_ms = delay, error = %e, "retrying");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }
        }
    }
}
