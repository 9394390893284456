//! Cache backend trait and entry type.
//!
//! A backend only stores and hands back whole entries; expiry decisions
//! belong to [`super::ResponseCache`], which owns the clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orbitdeck_core::OrbitResult;
use serde_json::Value;

/// One cached payload. Entries are replaced whole, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: Value,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, value: Value, expires_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            value,
            expires_at,
        }
    }

    /// An entry is live strictly before its expiry instant.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Cache backend trait for pluggable cache implementations.
///
/// Implementations must be safe for concurrent use. Writes are whole-entry
/// replacements, so a reader sees either the old entry or the new one.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch the entry stored under `key`, live or not.
    async fn get(&self, key: &str) -> OrbitResult<Option<CacheEntry>>;

    /// Store `entry`, replacing any previous entry with the same key.
    /// `now` is the caller's clock reading, used for any eviction the
    /// backend does to make room.
    async fn put(&self, entry: CacheEntry, now: DateTime<Utc>) -> OrbitResult<()>;

    /// Remove the entry under `key`. Returns whether one existed.
    async fn remove(&self, key: &str) -> OrbitResult<bool>;

    /// Drop every entry that has expired at `now`. Returns how many went.
    async fn purge_expired(&self, now: DateTime<Utc>) -> OrbitResult<u64>;

    /// Number of stored entries, expired ones included.
    async fn len(&self) -> OrbitResult<u64>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Lookups answered from a live entry.
    pub hits: u64,
    /// Lookups that had to compute.
    pub misses: u64,
    /// Number of entries currently stored.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
