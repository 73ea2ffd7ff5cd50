//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies. Each request names
//! the cached request by `url` plus `params`, exactly as the library does.

use serde::Deserialize;
use serde_json::Value;

use crate::request::Params;

/// Maximum accepted length of a request url
pub const MAX_URL_LENGTH: usize = 2048;

/// Request body for caching a result (PUT /cache)
#[derive(Debug, Clone, Deserialize)]
pub struct SetCacheRequest {
    /// Request path, may embed a query string
    pub url: String,
    /// Request parameters, including directives such as `dtMaxAge`
    #[serde(default)]
    pub params: Params,
    /// The result to cache
    pub data: Value,
    /// Identity token stored with the entry
    #[serde(default)]
    pub identity: Option<String>,
}

/// Request body for reading a cached result (POST /cache/lookup)
#[derive(Debug, Clone, Deserialize)]
pub struct GetCacheRequest {
    pub url: String,
    #[serde(default)]
    pub params: Params,
    /// Identity token the entry must have been stored with
    #[serde(default)]
    pub identity: Option<String>,
    /// Serve soft-expired data
    #[serde(default)]
    pub force_to_cache: bool,
}

/// Request body for dropping a cached result (DELETE /cache)
#[derive(Debug, Clone, Deserialize)]
pub struct RemoveCacheRequest {
    pub url: String,
    #[serde(default)]
    pub params: Params,
}

/// Validates a request url
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_url(url: &str) -> Option<String> {
    if url.is_empty() {
        return Some("Url cannot be empty".to_string());
    }
    if url.len() > MAX_URL_LENGTH {
        return Some(format!(
            "Url exceeds maximum length of {} characters",
            MAX_URL_LENGTH
        ));
    }
    None
}
