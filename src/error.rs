//! Error types for the request cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the request cache.
///
/// A miss is never an error inside the library: reads return `Ok(None)`.
/// `NotFound` only exists so the HTTP layer can report a miss as 404.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The storage medium cannot hold the write
    #[error("Capacity exceeded writing '{key}': needs {needed} bytes, {available} available")]
    CapacityExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    /// Value could not be encoded
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage medium failed for a reason other than capacity
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CacheError {
    /// Returns true for the only error the eviction retry loop recovers from.
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, CacheError::CapacityExceeded { .. })
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Storage(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::CapacityExceeded { .. } => StatusCode::INSUFFICIENT_STORAGE,
            CacheError::Serialization(_) | CacheError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the request cache.
pub type Result<T> = std::result::Result<T, CacheError>;
