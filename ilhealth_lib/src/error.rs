//! Caller-facing errors raised before any network activity.

use thiserror::Error;

/// Errors produced while resolving a request against the catalog.
///
/// These are caller mistakes (or a cancelled call) and are never retried.
/// Remote failures are not represented here; they come back inside a
/// `NormalizedResult` with `success = false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unknown subject '{subject}'. Must be one of: {known}")]
    UnknownSubject { subject: String, known: String },
    #[error("Unknown endpoint '{endpoint}' for subject '{subject}'. Available: {known}")]
    UnknownEndpoint {
        subject: String,
        endpoint: String,
        known: String,
    },
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("Request cancelled")]
    Cancelled,
}

impl ResolveError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownSubject { .. } => "UnknownSubjectError",
            Self::UnknownEndpoint { .. } => "UnknownEndpointError",
            Self::InvalidParameter { .. } => "InvalidParameterError",
            Self::Cancelled => "Cancelled",
        }
    }

    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_known_subjects() {
        let err = ResolveError::UnknownSubject {
            subject: "weather".into(),
            known: "beaches, childKi".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown subject 'weather'. Must be one of: beaches, childKi"
        );
        assert_eq!(err.kind(), "UnknownSubjectError");
    }

    #[test]
    fn invalid_parameter_kind() {
        let err = ResolveError::invalid("year", "expected integer");
        assert_eq!(err.kind(), "InvalidParameterError");
        assert_eq!(err.to_string(), "Invalid parameter 'year': expected integer");
    }
}
