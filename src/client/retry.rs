use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::error::{FetchError, chain_text, indicates_transient};

/// Errors that know whether another attempt might succeed.
pub trait Retryable: Sized {
    fn is_retryable(&self) -> bool;

    /// Converts the last failure into the terminal error reported once the
    /// retry budget is spent.
    fn exhausted(self, attempts: u32) -> Self;
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(e) | FetchError::Body(e) => {
                e.is_timeout() || indicates_transient(&chain_text(e))
            }
            _ => false,
        }
    }

    fn exhausted(self, attempts: u32) -> Self {
        FetchError::MaxRetries {
            attempts,
            last: Box::new(self),
        }
    }
}

/// Exponential backoff applied around each page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each following one.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before the `retry`-th retry (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor)
    }

    /// Runs `attempt` until it succeeds, fails with a non-retryable error, or
    /// the retry budget is exhausted.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut retries = 0;
        loop {
            let err = match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            if retries >= self.max_retries {
                warn!(
                    event_name = "client.retry.exhausted",
                    event_domain = "client",
                    operation,
                    attempts = retries + 1,
                    error = %err,
                    "giving up after retries"
                );
                return Err(err.exhausted(retries + 1));
            }

            retries += 1;
            let delay = self.backoff(retries);
            warn!(
                event_name = "client.retry.scheduled",
                event_domain = "client",
                operation,
                retry = retries,
                max_retries = self.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
