//! Configuration Module
//!
//! Library behaviour is set through [`CacheConfig`]. The server binary loads
//! [`Config`] from environment variables and projects it onto a `CacheConfig`.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{DEFAULT_EVICT_BATCH_SIZE, DEFAULT_MAX_RETRIES};
use crate::request::{DEFAULT_GRACE_PERIOD, DEFAULT_VOLATILE_PARAMS};

/// Default medium quota, the usual browser local storage size
pub const DEFAULT_CAPACITY_BYTES: usize = 5 * 1024 * 1024;

// == Cache Config ==
/// Request cache behaviour, fixed at construction.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Every read misses and every write is skipped
    pub disable_cache: bool,
    /// Log every cache decision at info level
    pub show_log: bool,
    /// How long soft-expired entries remain for fallback reads
    pub grace_period: Duration,
    /// Eviction rounds before a forced write gives up
    pub max_retries: usize,
    /// Keys evicted per round
    pub evict_batch_size: usize,
    /// Parameter names excluded from cache keys
    pub volatile_params: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            disable_cache: false,
            show_log: false,
            grace_period: DEFAULT_GRACE_PERIOD,
            max_retries: DEFAULT_MAX_RETRIES,
            evict_batch_size: DEFAULT_EVICT_BATCH_SIZE,
            volatile_params: DEFAULT_VOLATILE_PARAMS
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Byte quota of the storage medium
    pub capacity_bytes: usize,
    /// Grace period in seconds between soft expiry and hard delete
    pub grace_period_secs: u64,
    /// Eviction rounds before a forced write gives up
    pub max_retries: usize,
    /// Keys evicted per round
    pub evict_batch_size: usize,
    /// Global cache bypass
    pub disable_cache: bool,
    /// Log every cache decision at info level
    pub show_log: bool,
    /// HTTP server port
    pub server_port: u16,
    /// Background purge task interval in seconds
    pub purge_interval: u64,
    /// Backing file; in-memory medium when unset
    pub cache_file: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY_BYTES` - Medium quota in bytes (default: 5 MiB)
    /// - `GRACE_PERIOD_SECS` - Fallback window after soft expiry (default: 604800)
    /// - `MAX_RETRIES` - Eviction rounds per forced write (default: 20)
    /// - `EVICT_BATCH_SIZE` - Keys evicted per round (default: 20)
    /// - `DISABLE_CACHE` - `true`/`1` bypasses the cache (default: false)
    /// - `SHOW_LOG` - `true`/`1` logs every decision (default: false)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `PURGE_INTERVAL` - Purge frequency in seconds (default: 60)
    /// - `CACHE_FILE` - Path of the backing file (default: unset, in-memory)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity_bytes: parse_var("CACHE_CAPACITY_BYTES").unwrap_or(defaults.capacity_bytes),
            grace_period_secs: parse_var("GRACE_PERIOD_SECS").unwrap_or(defaults.grace_period_secs),
            max_retries: parse_var("MAX_RETRIES").unwrap_or(defaults.max_retries),
            evict_batch_size: parse_var("EVICT_BATCH_SIZE").unwrap_or(defaults.evict_batch_size),
            disable_cache: flag_var("DISABLE_CACHE"),
            show_log: flag_var("SHOW_LOG"),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            purge_interval: parse_var("PURGE_INTERVAL").unwrap_or(defaults.purge_interval),
            cache_file: env::var("CACHE_FILE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Returns the library settings carried by this config.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            disable_cache: self.disable_cache,
            show_log: self.show_log,
            grace_period: Duration::from_secs(self.grace_period_secs),
            max_retries: self.max_retries,
            evict_batch_size: self.evict_batch_size,
            ..CacheConfig::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            grace_period_secs: DEFAULT_GRACE_PERIOD.as_secs(),
            max_retries: DEFAULT_MAX_RETRIES,
            evict_batch_size: DEFAULT_EVICT_BATCH_SIZE,
            disable_cache: false,
            show_log: false,
            server_port: 3000,
            purge_interval: 60,
            cache_file: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn flag_var(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
        .unwrap_or(false)
}
