//! Error types for the API client.

/// Errors that can occur when making API requests.
///
/// Every failure is returned as a value; nothing in the client panics or
/// terminates the process.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,
    /// The connection could not be established or was dropped mid-request.
    #[error("Connection failed: {0}")]
    Connection(String),
    /// The API returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The response body was not valid JSON.
    #[error("Failed to decode response: {0}")]
    Decode(String),
    /// The base URL and request path did not form a valid URL.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Whether a read-only request that failed with this error may be retried.
    ///
    /// Timeouts, connection failures and 5xx responses are transient. 4xx
    /// responses, malformed payloads and bad URLs will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout | Error::Connection(_) => true,
            Error::HttpStatus { status, .. } => *status >= 500,
            Error::Decode(_) | Error::InvalidUrl(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(Error::Timeout.is_retryable());
        assert!(Error::Connection("reset".into()).is_retryable());
        assert!(Error::HttpStatus { status: 503, body: String::new() }.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!Error::HttpStatus { status: 404, body: String::new() }.is_retryable());
        assert!(!Error::HttpStatus { status: 429, body: String::new() }.is_retryable());
        assert!(!Error::Decode("eof".into()).is_retryable());
        assert!(!Error::InvalidUrl("x".into()).is_retryable());
    }
}
