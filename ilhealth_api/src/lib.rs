//! HTTP client for the Israel Ministry of Health data dashboard API.
//!
//! The client performs single-shot, read-only GET requests and decodes the
//! JSON body into a [`serde_json::Value`]. Retry policy and endpoint knowledge
//! live in the layer above.

mod client;
mod errors;
mod request;
pub use self::client::{Client, Fetch, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use self::errors::Error;
pub use self::request::RequestSpec;
pub use url::Url;
