//! Request Cache
//!
//! Caches request results by canonical key with layered expiry, identity
//! invalidation and forced-fallback reads, on top of the [`LruStore`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{CacheStats, LruStore};
use crate::clock::{SharedClock, SystemClock};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::request::entry::{CacheEntry, EntryState};
use crate::request::expiration::ExpirationPolicy;
use crate::request::key::KeyCanonicalizer;
use crate::request::options::{
    is_empty_payload, is_truthy, CacheOptions, DISABLE_CACHE_PARAM, FORCE_TO_CACHE_PARAM,
    SHOW_LOG_PARAM,
};
use crate::request::Params;
use crate::storage::StoreAdapter;

// == Request Cache ==
/// Owned cache context over one storage medium.
#[derive(Debug)]
pub struct RequestCache<S> {
    store: LruStore<S>,
    keys: KeyCanonicalizer,
    expiration: ExpirationPolicy,
    clock: SharedClock,
    disable_cache: bool,
    show_log: bool,
    stats: CacheStats,
}

impl<S: StoreAdapter> RequestCache<S> {
    // == Constructor ==
    /// Creates a cache over `store` using the wall clock.
    pub fn new(store: S, config: &CacheConfig) -> Result<Self> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Creates a cache over `store` with an injected time source.
    pub fn with_clock(store: S, config: &CacheConfig, clock: SharedClock) -> Result<Self> {
        let store = LruStore::new(store, clock.clone())?
            .with_retry_budget(config.max_retries, config.evict_batch_size);

        Ok(Self {
            store,
            keys: KeyCanonicalizer::new(config.volatile_params.iter().cloned()),
            expiration: ExpirationPolicy::new(config.grace_period),
            clock,
            disable_cache: config.disable_cache,
            show_log: config.show_log,
            stats: CacheStats::new(),
        })
    }

    /// Returns the key a request is cached under.
    pub fn canonical_key(&self, url: &str, params: &Params) -> String {
        self.keys.canonicalize(url, params)
    }

    // == Set Cache ==
    /// Caches `data` as the result of the request.
    ///
    /// Returns `Ok(false)` without writing when caching is disabled or the
    /// payload is empty. Errors are fatal: the payload cannot be serialized,
    /// or the medium cannot fit it even after eviction.
    pub fn set_cache<T: Serialize + ?Sized>(
        &mut self,
        url: &str,
        params: &Params,
        data: &T,
        options: &CacheOptions<'_>,
    ) -> Result<bool> {
        let verbose = self.is_verbose(params);
        if self.is_disabled(params) {
            self.log(verbose, url, "cache disabled, write skipped");
            return Ok(false);
        }

        let data = serde_json::to_value(data)?;
        if is_empty_payload(&data) {
            self.log(verbose, url, "empty payload, write skipped");
            return Ok(false);
        }

        let key = self.keys.canonicalize(url, params);
        let expiration = self.expiration.compute(params, self.clock.now_ms());
        let entry = CacheEntry::new(data, expiration, options.identity(url, params));

        let stored = self.store.set(&key, &entry, true)?;
        self.log(verbose, &key, "stored");
        Ok(stored)
    }

    // == Get Cache ==
    /// Returns the cached result of the request, or `None` on a miss.
    ///
    /// A miss covers: disabled cache, absent key, undecodable value, changed
    /// identity, hard-expired entry (which is also removed), and a
    /// soft-expired entry read without forced fallback.
    pub fn get_cache<T: DeserializeOwned>(
        &mut self,
        url: &str,
        params: &Params,
        options: &CacheOptions<'_>,
    ) -> Result<Option<T>> {
        let verbose = self.is_verbose(params);
        if self.is_disabled(params) {
            self.log(verbose, url, "cache disabled, read skipped");
            return Ok(None);
        }

        let key = self.keys.canonicalize(url, params);
        let entry: CacheEntry = match self.store.get(&key)? {
            Some(entry) => entry,
            None => return Ok(self.miss(verbose, &key, "absent")),
        };

        if entry.identity != options.identity(url, params) {
            return Ok(self.miss(verbose, &key, "identity changed"));
        }

        let state = entry.state(self.clock.now_ms());
        let forced = options.force_to_cache || is_truthy(params.get(FORCE_TO_CACHE_PARAM));

        match state {
            EntryState::Expired => {
                self.store.remove(&key)?;
                return Ok(self.miss(verbose, &key, "past hard delete, removed"));
            }
            EntryState::SoftExpired if !forced => {
                return Ok(self.miss(verbose, &key, "stale"));
            }
            EntryState::Live | EntryState::SoftExpired => {}
        }

        let data = match serde_json::from_value::<T>(entry.data) {
            Ok(data) => data,
            Err(err) => {
                debug!("Cached data under '{}' has an unexpected shape: {}", key, err);
                return Ok(self.miss(verbose, &key, "undecodable"));
            }
        };

        if state == EntryState::Live {
            self.stats.record_hit();
            self.log(verbose, &key, "hit");
        } else {
            self.stats.record_fallback_hit();
            self.log(verbose, &key, "stale hit (forced fallback)");
        }
        Ok(Some(data))
    }

    // == Remove Cache ==
    /// Drops the cached result of the request, if any.
    pub fn remove_cache(&mut self, url: &str, params: &Params) -> Result<()> {
        let key = self.keys.canonicalize(url, params);
        self.store.remove(&key)?;
        self.log(self.is_verbose(params), &key, "removed");
        Ok(())
    }

    // == Purge Expired ==
    /// Removes every entry past its hard-delete instant.
    ///
    /// Usage frequencies of the surviving entries are left untouched.
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> Result<usize> {
        let now = self.clock.now_ms();
        let mut removed = 0;

        for key in self.store.keys() {
            let expired = match self.store.peek::<CacheEntry>(&key)? {
                Some(entry) => entry.state(now) == EntryState::Expired,
                // Undecodable; nothing can ever read it again
                None => true,
            };
            if expired {
                self.store.remove(&key)?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Empties the whole medium.
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()
    }

    // == Accessors ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.evictions = self.store.evictions();
        stats.set_total_entries(self.store.len());
        stats
    }

    pub fn lru_store(&self) -> &LruStore<S> {
        &self.store
    }

    // == Internals ==
    fn is_disabled(&self, params: &Params) -> bool {
        self.disable_cache || is_truthy(params.get(DISABLE_CACHE_PARAM))
    }

    fn is_verbose(&self, params: &Params) -> bool {
        self.show_log || is_truthy(params.get(SHOW_LOG_PARAM))
    }

    fn miss<T>(&mut self, verbose: bool, key: &str, reason: &str) -> Option<T> {
        self.stats.record_miss();
        self.log(verbose, key, &format!("miss ({})", reason));
        None
    }

    fn log(&self, verbose: bool, key: &str, message: &str) {
        if verbose {
            info!("Request cache [{}]: {}", key, message);
        } else {
            debug!("Request cache [{}]: {}", key, message);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use serde_json::{json, Value};

    const URL: &str = "http://rap.alibaba-inc.com/mockjsdata/1427/api/list";
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap_or_default()
    }

    fn open() -> (RequestCache<MemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let cache =
            RequestCache::with_clock(MemoryStore::new(4096), &CacheConfig::default(), clock.clone())
                .unwrap();
        (cache, clock)
    }

    #[test]
    fn test_round_trip() {
        let (mut cache, _) = open();
        let none = CacheOptions::new();

        cache
            .set_cache(URL, &params(json!({"pageNo": 1})), &json!({"foo": 123}), &none)
            .unwrap();
        let value: Option<Value> = cache
            .get_cache(URL, &params(json!({"pageNo": 1})), &none)
            .unwrap();

        assert_eq!(value, Some(json!({"foo": 123})));
    }

    #[test]
    fn test_typed_round_trip() {
        #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
        struct Page {
            code: u16,
            ids: Vec<u32>,
        }

        let (mut cache, _) = open();
        let none = CacheOptions::new();
        let page = Page {
            code: 200,
            ids: vec![100],
        };

        cache.set_cache(URL, &Params::new(), &page, &none).unwrap();
        let back: Option<Page> = cache.get_cache(URL, &Params::new(), &none).unwrap();
        assert_eq!(back, Some(page));

        // Same entry read as an incompatible type is a miss
        let wrong: Option<String> = cache.get_cache(URL, &Params::new(), &none).unwrap();
        assert!(wrong.is_none());
    }

    #[test]
    fn test_empty_payload_not_cached() {
        let (mut cache, _) = open();
        let none = CacheOptions::new();

        assert!(!cache.set_cache(URL, &Params::new(), &json!({}), &none).unwrap());
        assert!(!cache.set_cache(URL, &Params::new(), &Value::Null, &none).unwrap());
        assert!(!cache.set_cache(URL, &Params::new(), &Option::<u8>::None, &none).unwrap());
        assert!(cache.lru_store().store().is_empty());

        assert!(cache.set_cache(URL, &Params::new(), &json!({"foo": 123}), &none).unwrap());
        // Entry plus ledger
        assert_eq!(cache.lru_store().store().len(), 2);
    }

    #[test]
    fn test_soft_expiry_then_forced_fallback() {
        let (mut cache, clock) = open();
        let none = CacheOptions::new();
        let data = json!({"code": 200, "list": [{"id": 100}]});

        cache
            .set_cache(URL, &params(json!({"dtMaxAge": 1000})), &data, &none)
            .unwrap();
        clock.advance(1000);

        let stale: Option<Value> = cache.get_cache(URL, &Params::new(), &none).unwrap();
        assert!(stale.is_none());

        let forced: Option<Value> = cache
            .get_cache(URL, &params(json!({"__forceToCache": true})), &none)
            .unwrap();
        assert_eq!(forced, Some(data.clone()));

        let forced: Option<Value> = cache
            .get_cache(URL, &Params::new(), &CacheOptions::new().force_to_cache())
            .unwrap();
        assert_eq!(forced, Some(data));

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.fallback_hits, 2);
    }

    #[test]
    fn test_hard_delete_removes_entry() {
        let (mut cache, clock) = open();
        let none = CacheOptions::new();

        cache
            .set_cache(URL, &params(json!({"dtMaxAge": 10})), &json!([1]), &none)
            .unwrap();
        clock.advance(10 + 7 * DAY_MS);

        let forced: Option<Value> = cache
            .get_cache(URL, &Params::new(), &CacheOptions::new().force_to_cache())
            .unwrap();
        assert!(forced.is_none());
        assert!(cache.lru_store().is_empty());
        assert!(cache.lru_store().store().is_empty());
    }

    #[test]
    fn test_identity_invalidation() {
        let (mut cache, _) = open();
        let user_a = |_: &str, _: &Params| "A".to_string();
        let user_b = |_: &str, _: &Params| "B".to_string();

        cache
            .set_cache(
                URL,
                &Params::new(),
                &json!({"foo": 1}),
                &CacheOptions::new().with_identity(&user_a),
            )
            .unwrap();

        let as_b: Option<Value> = cache
            .get_cache(URL, &Params::new(), &CacheOptions::new().with_identity(&user_b))
            .unwrap();
        assert!(as_b.is_none());

        let anonymous: Option<Value> = cache
            .get_cache(URL, &Params::new(), &CacheOptions::new())
            .unwrap();
        assert!(anonymous.is_none());

        let as_a: Option<Value> = cache
            .get_cache(URL, &Params::new(), &CacheOptions::new().with_identity(&user_a))
            .unwrap();
        assert_eq!(as_a, Some(json!({"foo": 1})));
    }

    #[test]
    fn test_disable_flags() {
        let clock = Arc::new(ManualClock::new(0));
        let config = CacheConfig {
            disable_cache: true,
            ..CacheConfig::default()
        };
        let mut disabled =
            RequestCache::with_clock(MemoryStore::new(4096), &config, clock).unwrap();
        let none = CacheOptions::new();

        assert!(!disabled.set_cache(URL, &Params::new(), &json!([1]), &none).unwrap());
        assert!(disabled.lru_store().store().is_empty());

        let (mut cache, _) = open();
        cache.set_cache(URL, &Params::new(), &json!([1]), &none).unwrap();
        let bypassed: Option<Value> = cache
            .get_cache(URL, &params(json!({"__disableCache": true})), &none)
            .unwrap();
        assert!(bypassed.is_none());
        assert!(!cache
            .set_cache(URL, &params(json!({"__disableCache": "true"})), &json!([2]), &none)
            .unwrap());
    }

    #[test]
    fn test_remove_cache() {
        let (mut cache, _) = open();
        let none = CacheOptions::new();

        cache
            .set_cache(URL, &params(json!({"a": 1})), &json!("x"), &none)
            .unwrap();
        cache.remove_cache(URL, &params(json!({"a": "1"}))).unwrap();

        let value: Option<Value> = cache.get_cache(URL, &params(json!({"a": 1})), &none).unwrap();
        assert!(value.is_none());
        assert!(cache.lru_store().store().is_empty());
    }

    #[test]
    fn test_purge_expired_keeps_live_and_stale() {
        let (mut cache, clock) = open();
        let none = CacheOptions::new();

        cache
            .set_cache(URL, &params(json!({"id": 1, "dtMaxAge": 10})), &json!(1), &none)
            .unwrap();
        cache
            .set_cache(URL, &params(json!({"id": 2, "dtMaxAge": 8 * DAY_MS})), &json!(2), &none)
            .unwrap();
        let frequency_before = cache
            .lru_store()
            .frequency(&cache.canonical_key(URL, &params(json!({"id": 2}))));

        clock.advance(7 * DAY_MS + 10);
        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert_eq!(cache.lru_store().len(), 1);
        assert_eq!(
            cache
                .lru_store()
                .frequency(&cache.canonical_key(URL, &params(json!({"id": 2})))),
            frequency_before
        );
    }

    #[test]
    fn test_serialization_failure_is_error() {
        use std::collections::HashMap;

        let (mut cache, _) = open();
        // Non-string map keys cannot become JSON
        let mut data: HashMap<(u8, u8), u8> = HashMap::new();
        data.insert((1, 2), 3);

        let result = cache.set_cache(URL, &Params::new(), &data, &CacheOptions::new());
        assert!(matches!(result, Err(crate::error::CacheError::Serialization(_))));
        assert!(cache.lru_store().is_empty());
    }
}
