use super::{TransportError, TransportResult};
use std::future::Future;
use std::time::Duration;

/// Statuses worth another attempt: timeouts, throttling, transient server faults
pub const DEFAULT_RETRYABLE_STATUSES: &[u16] = &[408, 429, 500, 502, 503, 504];

/// Delay schedule between attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// `base * 2^(n-1)` after the n-th failure, capped at `max`
    Exponential { base: Duration, max: Duration },
}

/// Bounded retry policy for game API calls.
///
/// Only network failures and statuses in `retry_on` are retried; game-logic
/// responses come back as `200` verdicts and never reach this path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub retry_on: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff: Backoff::Fixed(Duration::from_millis(2000)),
            retry_on: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable(&self, err: &TransportError) -> bool {
        match err {
            TransportError::Network { .. } => true,
            TransportError::Status { status, .. } => self.retry_on.contains(status),
            TransportError::Decode(_) | TransportError::Exhausted { .. } => false,
        }
    }

    /// Delay after the `failures`-th failed attempt (1-based)
    pub fn delay_for(&self, failures: u32) -> Duration {
        match &self.backoff {
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential { base, max } => {
                let exp = failures.saturating_sub(1).min(16);
                base.saturating_mul(1 << exp).min(*max)
            }
        }
    }

    /// Run `op` until it succeeds, fails terminally, or the budget runs out.
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> TransportResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !self.is_retryable(&e) => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    tracing::warn!(
                        call = label,
                        attempts = attempt,
                        timed_out = e.is_timeout(),
                        error = %e,
                        "Retry budget exhausted"
                    );
                    return Err(TransportError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    tracing::debug!(
                        call = label,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        timed_out = e.is_timeout(),
                        error = %e,
                        "Retrying request"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
