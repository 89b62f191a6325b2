//! Error types for the cache
//!
//! Provides unified error handling using thiserror. "Not found" is never an
//! error here: absence is a normal `Ok(None)` result.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Store Error Enum ==
/// Failures reported by the document store collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store did not answer in time
    #[error("Store timeout: {0}")]
    Timeout(String),

    /// A document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored document does not have the expected shape
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

/// Convenience Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Absent key, or contradictory entry options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A payload read back as text is not UTF-8
    #[error("Value is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// Store failure, passed through unmodified
    #[error(transparent)]
    Store(#[from] StoreError),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CacheError::InvalidUtf8(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CacheError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_is_transparent() {
        let err: CacheError = StoreError::Timeout("find_by_key".to_string()).into();
        assert_eq!(err.to_string(), "Store timeout: find_by_key");
        assert!(matches!(err, CacheError::Store(StoreError::Timeout(_))));
    }

    #[test]
    fn test_error_status_codes() {
        let test_cases = vec![
            (
                CacheError::InvalidArgument("key".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CacheError::from(String::from_utf8(vec![0xff]).unwrap_err()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                CacheError::Store(StoreError::Unavailable("down".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, expected_status) in test_cases {
            let response = error.into_response();
            assert_eq!(response.status(), expected_status);
        }
    }
}
