//! Request resolution: catalog lookup, parameter validation, request
//! building, fetch, and normalization for one data request.

use std::sync::Arc;

use ilhealth_api::{Fetch, RequestSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::catalog::{Catalog, EndpointDescriptor};
use crate::error::ResolveError;
use crate::normalize::{normalize, NormalizedResult, SourceEndpoint};
use crate::validation::{build_request, validate_parameters};

/// One caller request for data from a subject endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataRequest {
    pub subject_id: String,
    pub endpoint_name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl DataRequest {
    pub fn new(subject_id: &str, endpoint_name: &str) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            endpoint_name: endpoint_name.to_string(),
            parameters: Map::new(),
        }
    }

    pub fn with_parameter(mut self, name: &str, value: Value) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }
}

/// A validated request, ready to send.
#[derive(Debug, Clone)]
pub struct PreparedRequest<'a> {
    pub endpoint: &'a EndpointDescriptor,
    pub request: RequestSpec,
    pub source: SourceEndpoint,
}

/// Resolves [`DataRequest`]s against a catalog and fetches them.
///
/// Holds no per-request state; one resolver can serve any number of
/// concurrent requests.
#[derive(Debug)]
pub struct Resolver<F> {
    catalog: Arc<Catalog>,
    client: F,
}

impl<F: Fetch> Resolver<F> {
    pub fn new(catalog: Arc<Catalog>, client: F) -> Self {
        Self { catalog, client }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn client(&self) -> &F {
        &self.client
    }

    /// Looks up, validates and builds the request without touching the network.
    pub fn prepare(&self, request: &DataRequest) -> Result<PreparedRequest<'_>, ResolveError> {
        let endpoint = self
            .catalog
            .get_endpoint(&request.subject_id, &request.endpoint_name)?;
        let params = validate_parameters(endpoint, &request.parameters)?;
        let spec = build_request(endpoint, &params);

        let path = match spec.query_string() {
            Some(query) => format!("{}?{}", spec.path(), query),
            None => spec.path(),
        };

        Ok(PreparedRequest {
            endpoint,
            request: spec,
            source: SourceEndpoint {
                subject: request.subject_id.clone(),
                endpoint: endpoint.name.clone(),
                path,
            },
        })
    }

    /// Runs the full pipeline for one request.
    ///
    /// Catalog and parameter errors are returned as `Err` before any network
    /// activity. Remote failures come back as an unsuccessful
    /// [`NormalizedResult`].
    pub async fn resolve_and_fetch(
        &self,
        request: &DataRequest,
    ) -> Result<NormalizedResult, ResolveError> {
        let prepared = self.prepare(request)?;
        tracing::debug!(
            "Resolved {}/{} to {}",
            request.subject_id,
            request.endpoint_name,
            prepared.source.path
        );

        let result = match self.client.fetch(&prepared.request).await {
            Ok(raw) => normalize(raw, prepared.endpoint, prepared.source),
            Err(err) => {
                tracing::error!(
                    "Fetching {}/{} failed: {}",
                    request.subject_id,
                    request.endpoint_name,
                    err
                );
                NormalizedResult::remote_failure(&err, prepared.source)
            }
        };
        Ok(result)
    }

    /// Like [`Resolver::resolve_and_fetch`], but abandons the in-flight call
    /// when `token` is cancelled and reports [`ResolveError::Cancelled`].
    pub async fn resolve_and_fetch_cancellable(
        &self,
        request: &DataRequest,
        token: &CancellationToken,
    ) -> Result<NormalizedResult, ResolveError> {
        if token.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::info!(
                    "Request for {}/{} cancelled",
                    request.subject_id,
                    request.endpoint_name
                );
                Err(ResolveError::Cancelled)
            }
            result = self.resolve_and_fetch(request) => result,
        }
    }
}
