//! Environment-driven client configuration.

use std::time::Duration;

use ilhealth_api::{Client, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

use crate::client::{RetryPolicy, RetryingClient};

pub const ENV_BASE_URL: &str = "ILHEALTH_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "ILHEALTH_TIMEOUT_SECS";
pub const ENV_RETRY_ATTEMPTS: &str = "ILHEALTH_RETRY_ATTEMPTS";
pub const ENV_RETRY_BASE_MS: &str = "ILHEALTH_RETRY_BASE_MS";
pub const ENV_RETRY_MAX_MS: &str = "ILHEALTH_RETRY_MAX_MS";

/// Settings for talking to the dashboard API.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Reads the `ILHEALTH_*` environment variables, falling back to
    /// defaults for anything missing or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ClientConfig::from_env`] but with an arbitrary variable source.
    pub fn from_lookup<L>(lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse_u64 = |key: &str, default: u64| {
            lookup(key)
                .and_then(|val| val.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };

        let base_url = lookup(ENV_BASE_URL)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.base_url);
        let timeout = Duration::from_secs(
            parse_u64(ENV_TIMEOUT_SECS, defaults.timeout.as_secs()).max(1),
        );
        let max_attempts = lookup(ENV_RETRY_ATTEMPTS)
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(defaults.retry.max_attempts)
            .max(1);
        let base_delay = Duration::from_millis(parse_u64(
            ENV_RETRY_BASE_MS,
            defaults.retry.base_delay.as_millis() as u64,
        ));
        let max_delay = Duration::from_millis(parse_u64(
            ENV_RETRY_MAX_MS,
            defaults.retry.max_delay.as_millis() as u64,
        ))
        .max(base_delay);

        Self {
            base_url,
            timeout,
            retry: RetryPolicy {
                max_attempts,
                base_delay,
                max_delay,
                jitter: defaults.retry.jitter,
            },
        }
    }

    /// Builds the production fetcher: the HTTP client wrapped in the retry policy.
    pub fn build_client(&self) -> Result<RetryingClient<Client>, ilhealth_api::Error> {
        let client = Client::with_timeout(&self.base_url, self.timeout)?;
        Ok(RetryingClient::new(client, self.retry))
    }
}
