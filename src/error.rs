//! Error types for the state layer
//!
//! Library failures are modelled with thiserror enums; the HTTP surface maps
//! them onto status codes through `PortalError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Fetch Error ==
/// Failure reported by the backend contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network failure or 5xx; worth retrying
    #[error("transient fetch failure: {0}")]
    Transient(String),

    /// Non-retryable failure (4xx, envelope error code, malformed body)
    #[error("permanent fetch failure: {0}")]
    Permanent(String),
}

impl FetchError {
    /// Returns true when a retry may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

// == Storage Error ==
/// Failure reported by a key-value storage adapter.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The storage capacity ceiling was hit
    #[error("storage quota exceeded ({needed} bytes needed, {limit} allowed)")]
    QuotaExceeded { needed: usize, limit: usize },

    /// Underlying file system failure
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage is not usable in this environment
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

// == Store Error ==
/// Outcome of a store read that produced no usable data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Neither the backend nor a fallback produced data for the key
    #[error("{key} is unavailable: {reason}")]
    Unavailable { key: String, reason: String },

    /// The fetch was cancelled by invalidation or a full clear
    #[error("fetch for {0} was cancelled")]
    Cancelled(String),

    /// User-scoped operation attempted without an authenticated session
    #[error("not authenticated")]
    Unauthenticated,
}

// == Portal Error ==
/// Error type of the admin HTTP surface.
#[derive(Error, Debug)]
pub enum PortalError {
    /// Unknown store or key
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The requested record could not be produced
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// No authenticated session
    #[error("Unauthorized")]
    Unauthorized,

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for PortalError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unauthenticated => PortalError::Unauthorized,
            other => PortalError::Unavailable(other.to_string()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = match &self {
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PortalError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PortalError::Unauthorized => StatusCode::UNAUTHORIZED,
            PortalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP surface.
pub type Result<T> = std::result::Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_transient() {
        assert!(FetchError::Transient("timeout".into()).is_transient());
        assert!(!FetchError::Permanent("404".into()).is_transient());
    }

    #[test]
    fn test_store_error_maps_to_portal_error() {
        let err: PortalError = StoreError::Unauthenticated.into();
        assert!(matches!(err, PortalError::Unauthorized));

        let err: PortalError = StoreError::Cancelled("k".into()).into();
        assert!(matches!(err, PortalError::Unavailable(_)));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (PortalError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (PortalError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (PortalError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (PortalError::Unauthorized, StatusCode::UNAUTHORIZED),
            (PortalError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
