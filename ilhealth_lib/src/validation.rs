//! Parameter validation against an endpoint's declared schema, and
//! substitution of validated parameters into a concrete request.

use std::collections::BTreeMap;

use ilhealth_api::RequestSpec;
use serde_json::{Map, Value};

use crate::catalog::{EndpointDescriptor, ParamType, TemplatePart};
use crate::error::ResolveError;

/// Longest string value accepted for any parameter, in bytes.
pub const MAX_PARAM_LENGTH: usize = 200;

/// Parameters after validation, keyed and ordered by name, with defaults applied.
pub type ValidatedParams = BTreeMap<String, Value>;

/// Validate caller-supplied parameters against `endpoint.allowed_parameters`.
///
/// - undeclared parameter names are rejected;
/// - `null` counts as omitted;
/// - a supplied value must match its declared type exactly (no coercion);
/// - string values may not contain control characters or exceed
///   [`MAX_PARAM_LENGTH`];
/// - `path` values must be relative paths with no empty, `.` or `..`
///   segments;
/// - omitted required parameters are rejected; omitted optional ones take
///   their declared default, or are left out when there is none.
pub fn validate_parameters(
    endpoint: &EndpointDescriptor,
    params: &Map<String, Value>,
) -> Result<ValidatedParams, ResolveError> {
    for name in params.keys() {
        if !endpoint.allowed_parameters.contains_key(name) {
            let allowed = endpoint
                .allowed_parameters
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>();
            let reason = if allowed.is_empty() {
                format!("endpoint '{}' takes no parameters", endpoint.name)
            } else {
                format!(
                    "not accepted by endpoint '{}'. Allowed: {}",
                    endpoint.name,
                    allowed.join(", ")
                )
            };
            return Err(ResolveError::invalid(name, reason));
        }
    }

    let mut validated = ValidatedParams::new();
    for (name, spec) in &endpoint.allowed_parameters {
        match params.get(name).filter(|v| !v.is_null()) {
            Some(value) => {
                if !spec.param_type.accepts(value) {
                    return Err(ResolveError::invalid(
                        name,
                        format!("expected {}, got {}", spec.param_type, json_type_name(value)),
                    ));
                }
                if let Value::String(s) = value {
                    check_text(name, s)?;
                    if spec.param_type == ParamType::Path {
                        check_relative_path(name, s)?;
                    }
                }
                validated.insert(name.clone(), value.clone());
            }
            None if spec.required => {
                return Err(ResolveError::invalid(name, "required parameter is missing"));
            }
            None => {
                if let Some(default) = &spec.default {
                    validated.insert(name.clone(), default.clone());
                }
            }
        }
    }

    Ok(validated)
}

/// Build the concrete request for an endpoint from validated parameters.
///
/// `{name}` placeholders in the path template are replaced by the parameter
/// value in a single pass, so substituted text is never expanded again. A
/// `path` parameter filling a whole segment expands to several segments.
/// Every other parameter becomes a query pair, in name order.
pub fn build_request(endpoint: &EndpointDescriptor, params: &ValidatedParams) -> RequestSpec {
    let mut segments = Vec::new();
    for parts in endpoint.template() {
        if let [TemplatePart::Placeholder(name)] = parts.as_slice() {
            if endpoint.is_path_parameter(name) {
                if let Some(Value::String(path)) = params.get(name) {
                    segments.extend(path.split('/').map(str::to_string));
                    continue;
                }
            }
        }
        let segment = parts
            .iter()
            .map(|part| match part {
                TemplatePart::Literal(text) => text.clone(),
                TemplatePart::Placeholder(name) => {
                    params.get(name).map(value_to_string).unwrap_or_default()
                }
            })
            .collect::<String>();
        segments.push(segment);
    }

    params
        .iter()
        .filter(|(name, _)| !endpoint.placeholders().contains(*name))
        .fold(RequestSpec::from_segments(segments), |req, (name, value)| {
            req.with_query_pair(name, &value_to_string(value))
        })
}

/// Renders a scalar parameter the way it appears in a URL.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn check_text(name: &str, input: &str) -> Result<(), ResolveError> {
    if input.len() > MAX_PARAM_LENGTH {
        return Err(ResolveError::invalid(
            name,
            format!("exceeds maximum length of {} bytes", MAX_PARAM_LENGTH),
        ));
    }
    if input.chars().any(|c| c.is_control()) {
        return Err(ResolveError::invalid(name, "contains control characters"));
    }
    Ok(())
}

fn check_relative_path(name: &str, path: &str) -> Result<(), ResolveError> {
    let bad_segment = path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad_segment {
        return Err(ResolveError::invalid(
            name,
            "must be a relative path without empty, '.' or '..' segments",
        ));
    }
    if path.contains(['?', '#', '\\']) {
        return Err(ResolveError::invalid(name, "must not contain '?', '#' or '\\'"));
    }
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
