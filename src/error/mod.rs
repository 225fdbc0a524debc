//! Error Handling Module
//!
//! Error types for the storage client and the Bearer adaptation layer.
//!
//! - [`StorageError`] is returned from public operations.
//! - [`StructuralAccessError`] signals that an endpoint does not expose the
//!   session state the Bearer adaptation needs. It is caught by the adapter
//!   and only reaches callers through [`StorageError::Structural`] when they
//!   probe an endpoint directly.

use thiserror::Error;

/// An endpoint did not have the shape required to reach its session headers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralAccessError {
    /// A required attribute is not exposed by this endpoint type.
    #[error("endpoint does not expose '{0}'")]
    MissingAttribute(&'static str),

    /// The session could not be opened or inspected.
    #[error("session unavailable: {0}")]
    SessionUnavailable(String),
}

/// Errors returned by the storage client.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The VOSpace URI could not be parsed.
    #[error("Invalid VOSpace URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// Invalid configuration (bad header values, malformed endpoints).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Endpoint introspection failed.
    #[error("Structural access error: {0}")]
    Structural(#[from] StructuralAccessError),

    /// Transport-level failure from the HTTP client.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The service answered with an error status.
    #[error("API error {code}: {message}")]
    ApiError { code: u16, message: String },
}

impl StorageError {
    /// Create an [`StorageError::InvalidUri`].
    pub fn invalid_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Create an [`StorageError::ApiError`].
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
        }
    }

    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(e) => e.is_timeout() || e.is_connect(),
            Self::ApiError { code, .. } => *code == 429 || (500..600).contains(code),
            _ => false,
        }
    }

    /// Whether the service rejected our credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::ApiError { code: 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_classification() {
        assert!(StorageError::api_error(503, "busy").is_retryable());
        assert!(StorageError::api_error(429, "slow down").is_retryable());
        assert!(!StorageError::api_error(404, "missing").is_retryable());
        assert!(StorageError::api_error(401, "nope").is_auth_error());
        assert!(!StorageError::api_error(500, "boom").is_auth_error());
    }

    #[test]
    fn structural_error_converts() {
        let err: StorageError = StructuralAccessError::MissingAttribute("conn").into();
        assert!(matches!(
            err,
            StorageError::Structural(StructuralAccessError::MissingAttribute("conn"))
        ));
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Structural access error: endpoint does not expose 'conn'"
        );
    }
}
