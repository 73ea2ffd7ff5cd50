//! File Store Module
//!
//! Durable medium: a [`MemoryStore`] whose contents are mirrored to a JSON
//! file after every mutation. The file is replaced atomically via a
//! temporary sibling and a rename.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};
use crate::storage::{MemoryStore, StoreAdapter};

// == File Store ==
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl FileStore {
    // == Constructor ==
    /// Opens the store at `path`, loading any existing contents.
    ///
    /// A missing file starts an empty store. An unreadable or malformed file
    /// is an error rather than silently discarded data.
    pub fn open(path: impl Into<PathBuf>, capacity_bytes: usize) -> Result<Self> {
        let path = path.into();

        let items: HashMap<String, String> = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => HashMap::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                CacheError::Storage(format!("{} is not a store file: {}", path.display(), err))
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };

        info!(
            "File store opened at {} with {} items",
            path.display(),
            items.len()
        );

        Ok(Self {
            memory: MemoryStore::from_items(items, capacity_bytes),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of stored items.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.memory.used_bytes()
    }

    // == Flush ==
    fn flush(&self) -> Result<()> {
        let json = serde_json::to_string(self.memory.items())?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        debug!("File store flushed {} items", self.memory.len());
        Ok(())
    }

    /// Flushes, or reinstates `previous` if the file could not be written.
    fn commit(&mut self, previous: MemoryStore) -> Result<()> {
        if let Err(err) = self.flush() {
            warn!(
                "File store flush to {} failed, change discarded: {}",
                self.path.display(),
                err
            );
            self.memory = previous;
            return Err(err);
        }
        Ok(())
    }
}

impl StoreAdapter for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.memory.get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        let previous = self.memory.clone();
        self.memory.set(key, value)?;
        self.commit(previous)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if !self.memory.contains_key(key) {
            return Ok(());
        }
        let previous = self.memory.clone();
        self.memory.remove(key)?;
        self.commit(previous)
    }

    fn clear(&mut self) -> Result<()> {
        let previous = self.memory.clone();
        self.memory.clear()?;
        self.commit(previous)
    }
}
