//! Storage Module
//!
//! The flat string-keyed medium the cache persists into, plus two
//! implementations: a quota-bounded in-memory store and a file-backed one.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use tracing::debug;

use crate::error::Result;

// == Store Adapter ==
/// Synchronous key-value medium with bounded capacity.
///
/// `set` must fail with [`CacheError::CapacityExceeded`] when the write would
/// not fit, and must leave the previous value (if any) untouched in that case.
///
/// [`CacheError::CapacityExceeded`]: crate::error::CacheError::CapacityExceeded
pub trait StoreAdapter {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Boxed adapter used where the concrete medium is chosen at runtime.
pub type BoxedStore = Box<dyn StoreAdapter + Send + Sync>;

impl<S: StoreAdapter + ?Sized> StoreAdapter for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}

const PROBE_KEY: &str = "__storage_probe__";

// == Support Probe ==
/// Checks that the medium accepts a write and a removal.
///
/// Some media look available but reject every write (zero quota).
pub fn is_storage_supported<S: StoreAdapter + ?Sized>(store: &mut S) -> bool {
    let result = store
        .set(PROBE_KEY, PROBE_KEY.to_string())
        .and_then(|_| store.remove(PROBE_KEY));

    match result {
        Ok(()) => true,
        Err(err) => {
            debug!("Storage probe failed: {}", err);
            false
        }
    }
}
