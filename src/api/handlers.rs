//! API Handlers
//!
//! HTTP request handlers for each request cache endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{extract::State, Json};
use serde_json::Value;

use crate::config::{CacheConfig, Config};
use crate::error::{CacheError, Result};
use crate::models::{
    validate_url, GetCacheRequest, GetCacheResponse, HealthResponse, MessageResponse,
    RemoveCacheRequest, RemoveCacheResponse, SetCacheRequest, SetCacheResponse, StatsResponse,
};
use crate::request::{CacheOptions, Params, RequestCache};
use crate::storage::{is_storage_supported, BoxedStore, FileStore, MemoryStore};

/// Request cache over a medium chosen at startup.
pub type SharedCache = Arc<RwLock<RequestCache<BoxedStore>>>;

/// Application state shared across all handlers.
///
/// Every cache call takes the write lock: reads touch the eviction ledger,
/// and the evict-then-retry write sequence must not interleave.
#[derive(Clone)]
pub struct AppState {
    /// Lock-guarded request cache
    pub cache: SharedCache,
}

impl AppState {
    /// Creates a new AppState with the given request cache.
    pub fn new(cache: RequestCache<BoxedStore>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    /// Creates an AppState over an in-memory medium of `capacity_bytes`.
    pub fn in_memory(capacity_bytes: usize, config: &CacheConfig) -> Result<Self> {
        let store: BoxedStore = Box::new(MemoryStore::new(capacity_bytes));
        Ok(Self::new(RequestCache::new(store, config)?))
    }

    /// Creates a new AppState from configuration.
    ///
    /// Uses the file-backed medium when `cache_file` is set, and refuses a
    /// medium that cannot take a write.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut store: BoxedStore = match &config.cache_file {
            Some(path) => Box::new(FileStore::open(path, config.capacity_bytes)?),
            None => Box::new(MemoryStore::new(config.capacity_bytes)),
        };
        if !is_storage_supported(&mut store) {
            return Err(CacheError::Storage(
                "storage medium rejected a probe write".to_string(),
            ));
        }
        Ok(Self::new(RequestCache::new(store, &config.cache_config())?))
    }
}

/// Identity function returning the token sent by the client.
fn identity_of(identity: &Option<String>) -> impl Fn(&str, &Params) -> String + '_ {
    move |_, _| identity.clone().unwrap_or_default()
}

/// Handler for PUT /cache
///
/// Caches a request result.
pub async fn set_cache_handler(
    State(state): State<AppState>,
    Json(req): Json<SetCacheRequest>,
) -> Result<Json<SetCacheResponse>> {
    // Validate request
    if let Some(error_msg) = validate_url(&req.url) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    let identity = identity_of(&req.identity);
    let options = CacheOptions::new().with_identity(&identity);

    let key = cache.canonical_key(&req.url, &req.params);
    let stored = cache.set_cache(&req.url, &req.params, &req.data, &options)?;

    Ok(Json(SetCacheResponse::new(key, stored)))
}

/// Handler for POST /cache/lookup
///
/// Reads a cached request result; a miss is 404.
pub async fn get_cache_handler(
    State(state): State<AppState>,
    Json(req): Json<GetCacheRequest>,
) -> Result<Json<GetCacheResponse>> {
    if let Some(error_msg) = validate_url(&req.url) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    // Write lock: a hit updates the eviction ledger
    let mut cache = state.cache.write().await;

    let identity = identity_of(&req.identity);
    let mut options = CacheOptions::new().with_identity(&identity);
    if req.force_to_cache {
        options = options.force_to_cache();
    }
    let key = cache.canonical_key(&req.url, &req.params);
    match cache.get_cache::<Value>(&req.url, &req.params, &options)? {
        Some(data) => Ok(Json(GetCacheResponse::new(key, data))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /cache
///
/// Drops a cached request result.
pub async fn remove_cache_handler(
    State(state): State<AppState>,
    Json(req): Json<RemoveCacheRequest>,
) -> Result<Json<RemoveCacheResponse>> {
    if let Some(error_msg) = validate_url(&req.url) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    let key = cache.canonical_key(&req.url, &req.params);
    cache.remove_cache(&req.url, &req.params)?;

    Ok(Json(RemoveCacheResponse::new(key)))
}

/// Handler for POST /cache/clear
///
/// Empties the whole medium.
pub async fn clear_cache_handler(State(state): State<AppState>) -> Result<Json<MessageResponse>> {
    let mut cache = state.cache.write().await;
    cache.clear()?;

    Ok(Json(MessageResponse::new("Cache cleared")))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    // Acquire read lock for stats
    let cache = state.cache.read().await;
    let stats = cache.stats();

    Json(StatsResponse::from(&stats))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
