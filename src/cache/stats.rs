//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, stale fallbacks
//! and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of fresh cache hits
    pub hits: u64,
    /// Number of reads that found nothing usable (absent, stale, identity change)
    pub misses: u64,
    /// Number of forced-fallback reads served from a soft-expired entry
    pub fallback_hits: u64,
    /// Number of entries evicted under capacity pressure
    pub evictions: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Fallback hits count as hits. Returns 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.fallback_hits;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Fallback Hit ==
    pub fn record_fallback_hit(&mut self) {
        self.fallback_hits += 1;
    }

    // == Record Eviction ==
    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
