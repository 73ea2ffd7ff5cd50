//! Eviction Ledger Module
//!
//! Tracks usage frequency and last access time per cache key and ranks
//! keys for eviction: least frequently used first, then least recently used.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// == Ledger Entry ==
/// Usage record for one cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Number of read hits and writes since the key was created
    #[serde(rename = "fre")]
    pub frequency: u64,
    /// Unix milliseconds of the most recent touch
    #[serde(rename = "time")]
    pub last_access_time: i64,
}

// == Eviction Ledger ==
/// Frequency/recency bookkeeping, persisted as a JSON object keyed by cache key.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvictionLedger {
    entries: HashMap<String, LedgerEntry>,
}

impl EvictionLedger {
    // == Constructor ==
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Records an access to `key` at `now_ms`.
    ///
    /// New keys start at frequency 1.
    pub fn touch(&mut self, key: &str, now_ms: i64) {
        self.entries
            .entry(key.to_string())
            .and_modify(|entry| {
                entry.frequency = entry.frequency.saturating_add(1);
                entry.last_access_time = now_ms;
            })
            .or_insert(LedgerEntry {
                frequency: 1,
                last_access_time: now_ms,
            });
    }

    // == Remove ==
    /// Removes a key from the ledger, returning its record if present.
    pub fn remove(&mut self, key: &str) -> Option<LedgerEntry> {
        self.entries.remove(key)
    }

    /// Removes a batch of keys.
    pub fn remove_many(&mut self, keys: &[String]) {
        for key in keys {
            self.entries.remove(key);
        }
    }

    /// Puts back the record `key` had before a touch; `None` forgets the key.
    pub fn restore(&mut self, key: &str, previous: Option<LedgerEntry>) {
        match previous {
            Some(entry) => {
                self.entries.insert(key.to_string(), entry);
            }
            None => {
                self.entries.remove(key);
            }
        }
    }

    /// Forgets every key.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Rank For Eviction ==
    /// Returns up to `count` keys in eviction order.
    ///
    /// Ordered by frequency ascending, then last access time ascending.
    /// Ties beyond that fall back to key order so the result is stable.
    pub fn rank_for_eviction(&self, count: usize) -> Vec<String> {
        let mut ranked: Vec<(&String, &LedgerEntry)> = self.entries.iter().collect();
        ranked.sort_by(|(key_a, a), (key_b, b)| compare_for_eviction(key_a, a, key_b, b));

        ranked
            .into_iter()
            .take(count)
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Accessors ==
    /// Returns the record for `key`.
    pub fn get(&self, key: &str) -> Option<&LedgerEntry> {
        self.entries.get(key)
    }

    /// Returns the usage frequency of `key`.
    pub fn frequency(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.frequency)
    }

    /// Iterates over tracked keys in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn compare_for_eviction(
    key_a: &str,
    a: &LedgerEntry,
    key_b: &str,
    b: &LedgerEntry,
) -> Ordering {
    a.frequency
        .cmp(&b.frequency)
        .then(a.last_access_time.cmp(&b.last_access_time))
        .then_with(|| key_a.cmp(key_b))
}
