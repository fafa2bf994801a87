//! Response normalization: every upstream payload, whatever its subject,
//! is re-wrapped into a [`NormalizedResult`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::{EndpointDescriptor, ResponseShapeHint};

/// Why a result is unsuccessful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The remote call itself failed (after any retries).
    RemoteServiceError,
    /// The upstream answered, but its payload encodes an application failure.
    UpstreamApplicationError,
    /// The payload does not have the shape the endpoint declares.
    UnexpectedShapeError,
}

/// The transport-level failure behind a `RemoteServiceError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportErrorKind {
    Timeout,
    ConnectionError,
    HttpStatusError,
    DecodeError,
    InvalidUrl,
}

/// Structured error carried by an unsuccessful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultError {
    pub kind: ErrorKind,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<TransportErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ResultError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            cause: None,
            status: None,
        }
    }
}

impl From<&ilhealth_api::Error> for ResultError {
    fn from(err: &ilhealth_api::Error) -> Self {
        use ilhealth_api::Error;

        let (cause, status, detail) = match err {
            Error::Timeout => (TransportErrorKind::Timeout, None, err.to_string()),
            Error::Connection(_) => (TransportErrorKind::ConnectionError, None, err.to_string()),
            Error::HttpStatus { status, body } => (
                TransportErrorKind::HttpStatusError,
                Some(*status),
                if body.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    format!("HTTP {}: {}", status, body)
                },
            ),
            Error::Decode(_) => (TransportErrorKind::DecodeError, None, err.to_string()),
            Error::InvalidUrl(_) => (TransportErrorKind::InvalidUrl, None, err.to_string()),
        };
        Self {
            kind: ErrorKind::RemoteServiceError,
            detail,
            cause: Some(cause),
            status,
        }
    }
}

/// Payload of a successful result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultData {
    Records(Vec<Value>),
    Metadata(Map<String, Value>),
}

impl ResultData {
    pub fn records(&self) -> Option<&[Value]> {
        match self {
            ResultData::Records(records) => Some(records),
            ResultData::Metadata(_) => None,
        }
    }
}

/// Where a result came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEndpoint {
    pub subject: String,
    pub endpoint: String,
    /// Resolved path relative to the API root, with query string if any.
    pub path: String,
}

/// The uniform envelope returned for every data request.
///
/// `error` is present exactly when `success` is false, and `data` exactly
/// when it is true. The constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResult {
    success: bool,
    data: Option<ResultData>,
    error: Option<ResultError>,
    source_endpoint: SourceEndpoint,
}

impl NormalizedResult {
    pub fn success(data: ResultData, source_endpoint: SourceEndpoint) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            source_endpoint,
        }
    }

    pub fn failure(error: ResultError, source_endpoint: SourceEndpoint) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            source_endpoint,
        }
    }

    /// Wraps a failed remote call.
    pub fn remote_failure(err: &ilhealth_api::Error, source_endpoint: SourceEndpoint) -> Self {
        Self::failure(ResultError::from(err), source_endpoint)
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&ResultData> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&ResultError> {
        self.error.as_ref()
    }

    pub fn source_endpoint(&self) -> &SourceEndpoint {
        &self.source_endpoint
    }

    pub fn into_data(self) -> Option<ResultData> {
        self.data
    }
}

/// Map a raw decoded payload into a [`NormalizedResult`].
///
/// Upstream error envelopes are recognized first, whatever the declared
/// shape. Otherwise the payload must match `endpoint.response_shape_hint`
/// exactly; anything else is an `UnexpectedShapeError`.
pub fn normalize(
    raw: Value,
    endpoint: &EndpointDescriptor,
    source: SourceEndpoint,
) -> NormalizedResult {
    if let Some(detail) = upstream_error_detail(&raw) {
        tracing::warn!(
            "{}/{} returned an error envelope: {}",
            source.subject,
            source.endpoint,
            detail
        );
        return NormalizedResult::failure(
            ResultError::new(ErrorKind::UpstreamApplicationError, detail),
            source,
        );
    }

    let expected = endpoint.response_shape_hint;
    match (expected, raw) {
        (ResponseShapeHint::Records | ResponseShapeHint::RecordsOrObject, Value::Array(items)) => {
            if let Some(pos) = items.iter().position(|item| !item.is_object()) {
                let detail = format!(
                    "expected {}, but element {} is {}",
                    expected,
                    pos,
                    shape_name(&items[pos])
                );
                return unexpected_shape(detail, source);
            }
            NormalizedResult::success(ResultData::Records(items), source)
        }
        (ResponseShapeHint::Object | ResponseShapeHint::RecordsOrObject, Value::Object(map)) => {
            NormalizedResult::success(ResultData::Metadata(map), source)
        }
        (expected, other) => {
            let detail = format!("expected {}, found {}", expected, shape_name(&other));
            unexpected_shape(detail, source)
        }
    }
}

fn unexpected_shape(detail: String, source: SourceEndpoint) -> NormalizedResult {
    tracing::warn!(
        "{}/{} returned an unexpected shape: {}",
        source.subject,
        source.endpoint,
        detail
    );
    NormalizedResult::failure(
        ResultError::new(ErrorKind::UnexpectedShapeError, detail),
        source,
    )
}

/// Returns a description of the failure if `raw` is an upstream error envelope.
///
/// An envelope is an object with a truthy `error`, a non-empty `errors`
/// array, `success: false`, or a failure `status` string.
fn upstream_error_detail(raw: &Value) -> Option<String> {
    let obj = raw.as_object()?;

    let has_error = obj
        .get("error")
        .is_some_and(|e| !e.is_null() && e != &Value::Bool(false));
    let has_errors = obj
        .get("errors")
        .and_then(Value::as_array)
        .is_some_and(|errs| !errs.is_empty());
    let success_false = obj.get("success") == Some(&Value::Bool(false));
    let failed_status = obj
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| {
            matches!(
                s.to_ascii_lowercase().as_str(),
                "error" | "fail" | "failed" | "failure"
            )
        });

    if !(has_error || has_errors || success_false || failed_status) {
        return None;
    }

    let detail = obj
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| match obj.get("error") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(e)) => e.get("message").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .or_else(|| {
            obj.get("errors")
                .and_then(Value::as_array)
                .and_then(|errs| errs.first())
                .map(|first| match first {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
        })
        .unwrap_or_else(|| raw.to_string());
    Some(detail)
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
