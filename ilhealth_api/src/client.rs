//! HTTP client for the Ministry of Health dashboard API.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::{Error, RequestSpec};

/// Production API root. Data and dashboard-content paths are relative to it.
pub const DEFAULT_BASE_URL: &str = "https://datadashboard.health.gov.il/api";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("ilhealth/", env!("CARGO_PKG_VERSION"));

/// Anything that can execute a [`RequestSpec`] and return the decoded JSON body.
///
/// [`Client`] is the network implementation; the layer above wraps it with
/// retries and tests substitute simulated upstreams.
pub trait Fetch: Send + Sync {
    fn fetch(&self, request: &RequestSpec) -> impl Future<Output = Result<Value, Error>> + Send;
}

/// HTTP client for the dashboard API.
///
/// Holds one `reqwest::Client` for connection reuse. Each call makes exactly
/// one attempt.
#[derive(Debug, Clone)]
pub struct Client {
    /// Base URL for the API. Defaults to [`DEFAULT_BASE_URL`].
    base_api_url: Url,
    http: reqwest::Client,
}

impl Client {
    /// Creates a new client pointing at the production dashboard API.
    pub fn new() -> Result<Self, Error> {
        Self::with_timeout(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Creates a new client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a new client with a custom base URL and per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let base_api_url = Url::parse(base_url).map_err(|e| {
            tracing::error!("Invalid base URL {}: {}", base_url, e);
            Error::InvalidUrl(format!("{}: {}", base_url, e))
        })?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::Connection(e.to_string())
            })?;
        Ok(Self { base_api_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_api_url
    }

    fn get_url(&self, request: &RequestSpec) -> Result<Url, Error> {
        request.add_to_url(&self.base_api_url).ok_or_else(|| {
            tracing::error!("Base URL {} cannot carry a path", self.base_api_url);
            Error::InvalidUrl(self.base_api_url.to_string())
        })
    }

    /// Sends one GET request and decodes the body as JSON.
    pub async fn get_json(&self, request: &RequestSpec) -> Result<Value, Error> {
        let url = self.get_url(request)?;
        tracing::debug!("GET {}", url);

        let resp = self
            .http
            .get(url.clone())
            .header("accept", "application/json, text/plain, */*")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get {}: {}", url, e);
                classify(e)
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body from {}: {}", url, e);
            classify(e)
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request to {} failed with status {}: {}", url, status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        serde_json::from_str::<Value>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to decode response from {}: {} | body: {}", url, e, snippet);
            Error::Decode(format!("{} | body: {}", e, snippet))
        })
    }
}

impl Fetch for Client {
    async fn fetch(&self, request: &RequestSpec) -> Result<Value, Error> {
        self.get_json(request).await
    }
}

fn classify(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else {
        Error::Connection(err.to_string())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
