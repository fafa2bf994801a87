//! Library layer for the Israel Ministry of Health data dashboard tools.
//!
//! Wraps the `ilhealth_api` HTTP client with retries, a closed subject
//! catalog, parameter validation, response normalization and the tool
//! surface a host protocol layer exposes.

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod normalize;
pub mod resolver;
pub mod tools;
pub mod validation;

pub use ilhealth_api;

pub use catalog::{
    Catalog, CatalogError, EndpointDescriptor, Link, ParamType, ParameterSpec, ResponseShapeHint,
    Subject, SubjectSummary,
};
pub use client::{RetryPolicy, RetryingClient};
pub use config::ClientConfig;
pub use error::ResolveError;
pub use normalize::{ErrorKind, NormalizedResult, ResultData, ResultError, SourceEndpoint};
pub use resolver::{DataRequest, Resolver};
pub use tools::{HealthTools, SetupError, SubjectMetadata, ToolDefinition, ToolError};
