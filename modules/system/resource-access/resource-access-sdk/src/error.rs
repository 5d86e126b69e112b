//! Error types for the resource access layer.

use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Coarse class of an [`AccessError`], as seen by callers.
///
/// `BadRequest` means "fix the input", `Forbidden` means "the actor may not do
/// this", `NotFound` means "the addressed record does not exist".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    Forbidden,
    NotFound,
}

impl ErrorKind {
    /// HTTP status equivalent of this class.
    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// Errors produced while locating, classifying, resolving or compiling a request.
///
/// All variants are deterministic given the same input and registry state;
/// nothing here is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessError {
    /// The filter query could not be compiled.
    #[error("Invalid filter: {message}")]
    InvalidFilter { message: String },

    /// Verb, collection or action is not supported for the addressed target.
    #[error("Unsupported action: {message}")]
    UnsupportedAction { message: String },

    /// Malformed request shape (identifiers, attributes, versions).
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Permission check failed or the action is disabled.
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// An identifier could not be resolved to a record.
    #[error("Not found: {message}")]
    NotFound { message: String },
}

impl AccessError {
    #[must_use]
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unsupported_action(message: impl Into<String>) -> Self {
        Self::UnsupportedAction {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Class of this error. Filter and action failures are `BadRequest`-class.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFilter { .. }
            | Self::UnsupportedAction { .. }
            | Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    /// HTTP status equivalent.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.kind().status()
    }

    /// Human-readable message without the class prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidFilter { message }
            | Self::UnsupportedAction { message }
            | Self::BadRequest { message }
            | Self::Forbidden { message }
            | Self::NotFound { message } => message,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn filter_and_action_errors_are_bad_requests() {
        assert_eq!(
            AccessError::invalid_filter("x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AccessError::unsupported_action("x").kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(AccessError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(AccessError::not_found("x").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(AccessError::not_found("Vm 7")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "not_found", "message": "Vm 7"})
        );
    }
}
