//! Cache Entry Module
//!
//! The record persisted per canonical key, and its staleness state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::request::expiration::Expiration;

// == Entry State ==
/// Where an entry sits in its lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Before soft expiry: served to normal reads
    Live,
    /// Between soft expiry and hard delete: served only to forced-fallback reads
    SoftExpired,
    /// At or past hard delete: must be removed
    Expired,
}

// == Cache Entry ==
/// A cached request result with its expiry instants and identity token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// The cached payload
    pub data: Value,
    /// Unix milliseconds after which normal reads miss
    pub soft_expire_at: i64,
    /// Unix milliseconds after which the entry is purged
    pub hard_delete_at: i64,
    /// Caller-computed token; a different token at read time is a miss
    #[serde(default)]
    pub identity: String,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(data: Value, expiration: Expiration, identity: impl Into<String>) -> Self {
        Self {
            data,
            soft_expire_at: expiration.soft_expire_at,
            hard_delete_at: expiration.hard_delete_at.max(expiration.soft_expire_at),
            identity: identity.into(),
        }
    }

    // == State ==
    /// Classifies the entry at `now_ms`.
    ///
    /// Boundaries are inclusive on the expiring side: at exactly
    /// `soft_expire_at` the entry is already stale.
    pub fn state(&self, now_ms: i64) -> EntryState {
        if now_ms >= self.hard_delete_at {
            EntryState::Expired
        } else if now_ms >= self.soft_expire_at {
            EntryState::SoftExpired
        } else {
            EntryState::Live
        }
    }
}
