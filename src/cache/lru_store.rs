//! LRU Store Module
//!
//! Bounded persistent cache: encodes values into a [`StoreAdapter`], keeps the
//! eviction ledger in lock-step with the stored keys, and on capacity
//! overflow evicts the lowest ranked keys in batches and retries the write.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{codec, EvictionLedger};
use crate::clock::SharedClock;
use crate::error::{CacheError, Result};
use crate::storage::StoreAdapter;

// == Public Constants ==
/// Reserved medium key holding the persisted ledger
pub const LEDGER_KEY: &str = "cache_queue";

/// Eviction rounds attempted before a forced write gives up
pub const DEFAULT_MAX_RETRIES: usize = 20;

/// Keys evicted per round
pub const DEFAULT_EVICT_BATCH_SIZE: usize = 20;

// == LRU Store ==
/// Cache over a bounded medium with frequency/recency eviction.
///
/// Not internally synchronized: the eviction-then-retry sequence reads the
/// ledger and mutates the medium non-atomically, so a multi-threaded host
/// must hold one lock around every call.
#[derive(Debug)]
pub struct LruStore<S> {
    /// Underlying medium
    store: S,
    /// Frequency/recency bookkeeping, mirrored under `LEDGER_KEY`
    ledger: EvictionLedger,
    clock: SharedClock,
    max_retries: usize,
    evict_batch_size: usize,
    evictions: u64,
}

impl<S: StoreAdapter> LruStore<S> {
    // == Constructor ==
    /// Wraps a medium, loading the ledger persisted in it if there is one.
    ///
    /// A corrupt ledger is discarded and rebuilt as keys are touched again.
    pub fn new(store: S, clock: SharedClock) -> Result<Self> {
        let ledger = match store.get(LEDGER_KEY)? {
            Some(raw) => codec::decode(&raw).unwrap_or_else(|| {
                warn!("Persisted eviction ledger is corrupt, starting empty");
                EvictionLedger::new()
            }),
            None => EvictionLedger::new(),
        };

        debug!("LRU store opened with {} tracked keys", ledger.len());

        Ok(Self {
            store,
            ledger,
            clock,
            max_retries: DEFAULT_MAX_RETRIES,
            evict_batch_size: DEFAULT_EVICT_BATCH_SIZE,
            evictions: 0,
        })
    }

    /// Overrides the eviction retry budget.
    pub fn with_retry_budget(mut self, max_retries: usize, evict_batch_size: usize) -> Self {
        self.max_retries = max_retries;
        self.evict_batch_size = evict_batch_size.max(1);
        self
    }

    // == Set ==
    /// Stores a value under `key`.
    ///
    /// Returns `Ok(true)` once written. When the medium is full and
    /// `force_evict` is false, returns `Ok(false)` and changes nothing.
    /// When `force_evict` is true, evicts ranked candidates and retries; the
    /// capacity error is returned only if the retry budget or the candidates
    /// run out first.
    pub fn set<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
        force_evict: bool,
    ) -> Result<bool> {
        if key == LEDGER_KEY {
            return Err(CacheError::InvalidRequest(format!(
                "'{}' is reserved for the eviction ledger",
                LEDGER_KEY
            )));
        }

        let encoded = codec::encode(value)?;

        let mut last_err = match self.try_write(key, &encoded) {
            Ok(()) => return Ok(true),
            Err(err) if err.is_capacity_exceeded() => err,
            Err(err) => return Err(err),
        };

        if !force_evict {
            debug!("Write of '{}' rejected: {}", key, last_err);
            return Ok(false);
        }

        for round in 1..=self.max_retries {
            let candidates = self.ledger.rank_for_eviction(self.evict_batch_size);
            if candidates.is_empty() {
                // Last attempt against whatever the medium now holds
                match self.try_write(key, &encoded) {
                    Ok(()) => return Ok(true),
                    Err(err) if err.is_capacity_exceeded() => last_err = err,
                    Err(err) => return Err(err),
                }
                warn!("No eviction candidates left while writing '{}'", key);
                break;
            }

            self.evict(&candidates)?;

            match self.try_write(key, &encoded) {
                Ok(()) => {
                    debug!("Write of '{}' succeeded after {} eviction rounds", key, round);
                    return Ok(true);
                }
                Err(err) if err.is_capacity_exceeded() => last_err = err,
                Err(err) => return Err(err),
            }
        }

        warn!("Giving up on '{}': {}", key, last_err);
        Err(last_err)
    }

    // == Get ==
    /// Reads and decodes the value under `key`, counting the access.
    ///
    /// A missing key and an undecodable value are both `Ok(None)`.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>> {
        let value = match self.peek(key)? {
            Some(value) => value,
            None => return Ok(None),
        };

        self.ledger.touch(key, self.clock.now_ms());
        self.persist_ledger_lenient(key)?;

        Ok(Some(value))
    }

    // == Peek ==
    /// Reads and decodes without touching the ledger.
    pub fn peek<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        if key == LEDGER_KEY {
            return Ok(None);
        }

        let raw = match self.store.get(key)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let decoded = codec::decode(&raw);
        if decoded.is_none() {
            debug!("Value under '{}' failed to decode, treating as miss", key);
        }
        Ok(decoded)
    }

    // == Remove ==
    /// Deletes `key` from the medium and the ledger. Absent keys are a no-op.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        if key == LEDGER_KEY {
            return Ok(());
        }

        self.store.remove(key)?;
        if self.ledger.remove(key).is_some() {
            self.persist_ledger_lenient(key)?;
        }
        Ok(())
    }

    // == Clear ==
    /// Wipes the whole medium and the ledger.
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()?;
        self.ledger.clear();
        Ok(())
    }

    // == Accessors ==
    /// Returns the tracked cache keys in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.ledger.keys().cloned().collect()
    }

    pub fn frequency(&self, key: &str) -> Option<u64> {
        self.ledger.frequency(key)
    }

    pub fn ledger(&self) -> &EvictionLedger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the number of entries evicted since this store was opened.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }

    // == Internals ==
    /// One non-forced write attempt: data, ledger touch, ledger persistence.
    ///
    /// If the ledger no longer fits, the key's previous value and ledger
    /// record are put back, so a failed attempt changes nothing.
    fn try_write(&mut self, key: &str, encoded: &str) -> Result<()> {
        let previous_value = self.store.get(key)?;
        self.store.set(key, encoded.to_string())?;

        let previous_entry = self.ledger.get(key).copied();
        self.ledger.touch(key, self.clock.now_ms());

        if let Err(err) = self.persist_ledger() {
            // The persisted ledger was left untouched by the failed write
            self.ledger.restore(key, previous_entry);
            match previous_value {
                Some(value) => self.store.set(key, value)?,
                None => self.store.remove(key)?,
            }
            return Err(err);
        }

        Ok(())
    }

    fn evict(&mut self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.store.remove(key)?;
            self.evictions += 1;
            debug!("Evicted '{}'", key);
        }
        self.ledger.remove_many(keys);
        self.persist_ledger()
    }

    fn persist_ledger(&mut self) -> Result<()> {
        if self.ledger.is_empty() {
            return self.store.remove(LEDGER_KEY);
        }
        let encoded = codec::encode(&self.ledger)?;
        self.store.set(LEDGER_KEY, encoded)
    }

    /// Persists the ledger, tolerating a full medium.
    ///
    /// The in-memory ledger stays authoritative for this process; the next
    /// successful write brings the persisted copy up to date.
    fn persist_ledger_lenient(&mut self, key: &str) -> Result<()> {
        match self.persist_ledger() {
            Err(err) if err.is_capacity_exceeded() => {
                warn!("Could not persist ledger after touching '{}': {}", key, err);
                Ok(())
            }
            other => other,
        }
    }
}
