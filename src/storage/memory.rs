//! Memory Store Module
//!
//! HashMap-backed medium with a byte quota. Usage is the sum of key and
//! value lengths, the way browser local storage counts its quota.

use std::collections::HashMap;

use crate::error::{CacheError, Result};
use crate::storage::StoreAdapter;

// == Memory Store ==
#[derive(Debug, Clone)]
pub struct MemoryStore {
    items: HashMap<String, String>,
    capacity_bytes: usize,
    used_bytes: usize,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store that holds at most `capacity_bytes`.
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            items: HashMap::new(),
            capacity_bytes,
            used_bytes: 0,
        }
    }

    /// Rebuilds a store from previously persisted items.
    ///
    /// Items are accepted even if they exceed the quota; later writes will
    /// fail until enough has been removed.
    pub(crate) fn from_items(items: HashMap<String, String>, capacity_bytes: usize) -> Self {
        let used_bytes = items.iter().map(|(k, v)| k.len() + v.len()).sum();
        Self {
            items,
            capacity_bytes,
            used_bytes,
        }
    }

    pub(crate) fn items(&self) -> &HashMap<String, String> {
        &self.items
    }

    // == Accessors ==
    pub fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Returns the number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Iterates over stored keys in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.items.keys()
    }
}

impl StoreAdapter for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let previous = self.items.get(key).map_or(0, |old| key.len() + old.len());
        let needed = key.len() + value.len();
        let available = self.capacity_bytes.saturating_sub(self.used_bytes) + previous;

        if needed > available {
            return Err(CacheError::CapacityExceeded {
                key: key.to_string(),
                needed,
                available,
            });
        }

        self.used_bytes = self.used_bytes - previous + needed;
        self.items.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if let Some(old) = self.items.remove(key) {
            self.used_bytes -= key.len() + old.len();
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.items.clear();
        self.used_bytes = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut store = MemoryStore::new(100);

        store.set("key", "value".to_string()).unwrap();

        assert_eq!(store.get("key").unwrap(), Some("value".to_string()));
        assert_eq!(store.used_bytes(), 8);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let store = MemoryStore::new(100);
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_capacity_exceeded_keeps_previous_value() {
        let mut store = MemoryStore::new(10);

        store.set("k", "1234".to_string()).unwrap();
        let err = store.set("k", "1234567890".to_string()).unwrap_err();

        assert!(err.is_capacity_exceeded());
        assert_eq!(store.get("k").unwrap(), Some("1234".to_string()));
        assert_eq!(store.used_bytes(), 5);
    }

    #[test]
    fn test_overwrite_reuses_old_space() {
        let mut store = MemoryStore::new(10);

        store.set("k", "123456789".to_string()).unwrap();
        // Replacing with the same size must fit even though the store is full
        store.set("k", "987654321".to_string()).unwrap();

        assert_eq!(store.used_bytes(), 10);
    }

    #[test]
    fn test_remove_frees_space() {
        let mut store = MemoryStore::new(10);

        store.set("a", "12345678".to_string()).unwrap();
        assert!(store.set("b", "12".to_string()).is_err());

        store.remove("a").unwrap();
        store.set("b", "12".to_string()).unwrap();
        assert_eq!(store.used_bytes(), 3);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut store = MemoryStore::new(10);
        store.remove("missing").unwrap();
        assert_eq!(store.used_bytes(), 0);
    }

    #[test]
    fn test_clear() {
        let mut store = MemoryStore::new(100);

        store.set("a", "1".to_string()).unwrap();
        store.set("b", "2".to_string()).unwrap();
        store.clear().unwrap();

        assert!(store.is_empty());
        assert_eq!(store.used_bytes(), 0);
    }
}
