//! Request Cache Module
//!
//! Request-level caching on top of the LRU store: canonical keys, layered
//! expiration, identity invalidation and forced-fallback reads.

mod entry;
mod expiration;
mod facade;
mod key;
mod options;

pub use entry::{CacheEntry, EntryState};
pub use expiration::{
    end_of_day_ms, Expiration, ExpirationPolicy, DEFAULT_GRACE_PERIOD, EXPIRE_TIME_PARAM,
    MAX_AGE_PARAM,
};
pub use facade::RequestCache;
pub use key::{stringify, KeyCanonicalizer, DEFAULT_VOLATILE_PARAMS, DIRECTIVE_MARKER};
pub use options::{
    is_empty_payload, is_truthy, CacheOptions, IdentityKeyFn, DISABLE_CACHE_PARAM,
    FORCE_TO_CACHE_PARAM, SHOW_LOG_PARAM,
};

/// Request parameters: name to JSON value.
pub type Params = serde_json::Map<String, serde_json::Value>;
