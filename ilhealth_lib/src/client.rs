//! Retry wrapper around any [`Fetch`] implementation.

use std::time::Duration;

use ilhealth_api::{Error, Fetch, RequestSpec};
use rand::Rng;
use serde_json::Value;

/// Bounded retry with exponential backoff for read-only requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Never less than 1.
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Randomize each delay by ±20%, still capped at `max_delay`.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(5000),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that retries immediately, for tests and simulated upstreams.
    pub fn no_delay(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: false,
        }
    }

    /// Delay before retry number `retry` (1 for the first retry).
    pub fn delay_for_retry(&self, retry: usize) -> Duration {
        let shift = (retry.saturating_sub(1)).min(30) as u32;
        let exp = 1u32 << shift;
        let base = self.base_delay.saturating_mul(exp).min(self.max_delay);
        if self.jitter && !base.is_zero() {
            let factor = rand::thread_rng().gen_range(0.8..1.2);
            base.mul_f64(factor).min(self.max_delay)
        } else {
            base
        }
    }
}

/// Fetcher that retries transient failures of an inner fetcher.
///
/// Timeouts, connection failures and 5xx responses are retried up to
/// `max_attempts` total attempts. 4xx responses and decode failures are
/// returned after the first attempt.
#[derive(Debug, Clone)]
pub struct RetryingClient<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: Fetch> RetryingClient<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<F: Fetch> Fetch for RetryingClient<F> {
    async fn fetch(&self, request: &RequestSpec) -> Result<Value, Error> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match self.inner.fetch(request).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= max_attempts || !err.is_retryable() {
                        if attempt > 1 {
                            tracing::error!(
                                "{} failed after {} attempts: {}",
                                request.path(),
                                attempt,
                                err
                            );
                        }
                        return Err(err);
                    }
                    let delay = self.policy.delay_for_retry(attempt);
                    tracing::warn!(
                        "{} request failed (attempt {}/{}): {}, retrying in {:.1}s",
                        request.path(),
                        attempt,
                        max_attempts,
                        err,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
