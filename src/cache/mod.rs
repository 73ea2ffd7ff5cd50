//! Cache Module
//!
//! Bounded persistent cache: length-checked codec, frequency/recency
//! eviction ledger, and the LRU store that ties them to a storage medium.

pub mod codec;
mod ledger;
mod lru_store;
mod stats;


// Re-export public types
pub use ledger::{EvictionLedger, LedgerEntry};
pub use lru_store::{LruStore, DEFAULT_EVICT_BATCH_SIZE, DEFAULT_MAX_RETRIES, LEDGER_KEY};
pub use stats::CacheStats;
