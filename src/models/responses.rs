//! Response DTOs for the cache HTTP API
//!
//! Defines the JSON bodies returned by the API. Payloads themselves are
//! returned as raw bytes, not JSON.

use serde::Serialize;

/// Response body for the SET, REFRESH and DELETE operations
#[derive(Debug, Clone, Serialize)]
pub struct KeyResponse {
    /// Success message
    pub message: String,
    /// The key that was acted on
    pub key: String,
}

impl KeyResponse {
    /// Creates a response for a stored key
    pub fn set(key: impl Into<String>) -> Self {
        Self::with_verb(key.into(), "set")
    }

    /// Creates a response for a refreshed key
    pub fn refreshed(key: impl Into<String>) -> Self {
        Self::with_verb(key.into(), "refreshed")
    }

    /// Creates a response for a removed key
    pub fn removed(key: impl Into<String>) -> Self {
        Self::with_verb(key.into(), "removed")
    }

    fn with_verb(key: String, verb: &str) -> Self {
        Self {
            message: format!("Key '{}' {} successfully", key, verb),
            key,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body, also used for missing keys
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
