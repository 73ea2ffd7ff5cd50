//! Request Cache - A persistent, capacity-bounded cache for request results
//!
//! Results are stored in a size-limited key-value medium. Eviction removes the
//! least frequently, then least recently, used keys. Stale results remain
//! available to forced-fallback reads until their hard-delete instant.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod request;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use request::{CacheOptions, Params, RequestCache};
pub use storage::{FileStore, MemoryStore, StoreAdapter};
pub use tasks::spawn_purge_task;
