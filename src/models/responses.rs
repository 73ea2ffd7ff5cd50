//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;

/// Response body for a cache hit (POST /cache/lookup)
#[derive(Debug, Clone, Serialize)]
pub struct GetCacheResponse {
    /// Canonical key of the request
    pub key: String,
    /// The cached result
    pub data: Value,
}

impl GetCacheResponse {
    /// Creates a new GetCacheResponse
    pub fn new(key: impl Into<String>, data: Value) -> Self {
        Self {
            key: key.into(),
            data,
        }
    }
}

/// Response body for caching a result (PUT /cache)
#[derive(Debug, Clone, Serialize)]
pub struct SetCacheResponse {
    /// Outcome message
    pub message: String,
    /// Canonical key of the request
    pub key: String,
    /// False when the write was skipped (cache disabled or empty payload)
    pub stored: bool,
}

impl SetCacheResponse {
    /// Creates a new SetCacheResponse
    pub fn new(key: impl Into<String>, stored: bool) -> Self {
        let key = key.into();
        let message = if stored {
            format!("Key '{}' cached successfully", key)
        } else {
            format!("Key '{}' not cached", key)
        };
        Self {
            message,
            key,
            stored,
        }
    }
}

/// Response body for dropping a cached result (DELETE /cache)
#[derive(Debug, Clone, Serialize)]
pub struct RemoveCacheResponse {
    /// Outcome message
    pub message: String,
    /// Canonical key of the request
    pub key: String,
}

impl RemoveCacheResponse {
    /// Creates a new RemoveCacheResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' removed successfully", key),
            key,
        }
    }
}

/// Response body carrying only a message (POST /cache/clear)
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of fresh cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of forced-fallback hits on stale entries
    pub fallback_hits: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate ((hits + fallback_hits) / reads)
    pub hit_rate: f64,
}

impl From<&CacheStats> for StatsResponse {
    fn from(stats: &CacheStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            fallback_hits: stats.fallback_hits,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
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

/// Error response body for all error conditions
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
