//! Process-local cache backend over a concurrent hash map.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use orbitdeck_core::OrbitResult;

use super::traits::{CacheBackend, CacheEntry};

/// Default cap on stored entries.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// In-memory [`CacheBackend`] holding at most `max_entries` entries.
///
/// Each key lives in its own shard slot, so a `put` on one key never blocks
/// readers of another. A `put` of a new key into a full map first sweeps
/// entries expired at the caller's `now`, then evicts the entries closest
/// to expiry down to a low-water mark 10% under the cap.
#[derive(Debug)]
pub struct InMemoryCacheBackend {
    entries: DashMap<String, CacheEntry>,
    max_entries: usize,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Size the map is trimmed down to before the new entry goes in.
    fn low_water(&self) -> usize {
        self.max_entries.saturating_sub(self.max_entries / 10 + 1)
    }

    fn sweep(&self, now: DateTime<Utc>) -> u64 {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live_at(now));
        before.saturating_sub(self.entries.len()) as u64
    }

    /// Evict the entries that expire soonest until at most `target` remain.
    fn evict_to(&self, target: usize) -> u64 {
        let excess = self.entries.len().saturating_sub(target);
        if excess == 0 {
            return 0;
        }
        let mut by_expiry: Vec<(DateTime<Utc>, String)> = self
            .entries
            .iter()
            .map(|entry| (entry.value().expires_at, entry.key().clone()))
            .collect();
        by_expiry.sort_unstable();

        let mut evicted = 0;
        for (_, key) in by_expiry.into_iter().take(excess) {
            if self.entries.remove(&key).is_some() {
                evicted += 1;
            }
        }
        evicted
    }

    fn make_room(&self, now: DateTime<Utc>) {
        let swept = self.sweep(now);
        let evicted = if self.entries.len() >= self.max_entries {
            self.evict_to(self.low_water())
        } else {
            0
        };
        tracing::debug!(swept, evicted, "cache at capacity");
    }
}

impl Default for InMemoryCacheBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> OrbitResult<Option<CacheEntry>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, entry: CacheEntry, now: DateTime<Utc>) -> OrbitResult<()> {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&entry.key) {
            self.make_room(now);
        }
        self.entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> OrbitResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> OrbitResult<u64> {
        Ok(self.sweep(now))
    }

    async fn len(&self) -> OrbitResult<u64> {
        Ok(self.entries.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_replaces_whole_entry() -> OrbitResult<()> {
        let backend = InMemoryCacheBackend::new();
        let now = Utc::now();
        let later = now + Duration::seconds(60);
        backend.put(CacheEntry::new("k", json!({"a": 1}), later), now).await?;
        backend.put(CacheEntry::new("k", json!({"b": 2}), later), now).await?;

        let entry = backend.get("k").await?;
        assert_eq!(entry.map(|e| e.value), Some(json!({"b": 2})));
        assert_eq!(backend.len().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_purge_expired() -> OrbitResult<()> {
        let backend = InMemoryCacheBackend::new();
        let now = Utc::now();
        backend.put(CacheEntry::new("old", json!(1), now - Duration::seconds(1)), now).await?;
        backend.put(CacheEntry::new("new", json!(2), now + Duration::seconds(60)), now).await?;

        assert_eq!(backend.purge_expired(now).await?, 1);
        assert!(backend.get("old").await?.is_none());
        assert!(backend.get("new").await?.is_some());
        assert!(backend.remove("new").await?);
        assert!(!backend.remove("new").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_capacity_sweeps_expired_before_evicting() -> OrbitResult<()> {
        let backend = InMemoryCacheBackend::with_max_entries(3);
        let now = Utc::now();
        let later = now + Duration::seconds(60);
        backend.put(CacheEntry::new("a", json!(1), later), now).await?;
        backend.put(CacheEntry::new("b", json!(2), now + Duration::seconds(5)), now).await?;
        backend.put(CacheEntry::new("c", json!(3), later), now).await?;

        // `b` has expired by the caller's clock, so nothing live is evicted.
        let after = now + Duration::seconds(10);
        backend.put(CacheEntry::new("d", json!(4), after + Duration::seconds(60)), after).await?;
        assert_eq!(backend.len().await?, 3);
        assert!(backend.get("b").await?.is_none());
        for key in ["a", "c", "d"] {
            assert!(backend.get(key).await?.is_some(), "{} evicted", key);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_live_entries_are_bounded() -> OrbitResult<()> {
        let backend = InMemoryCacheBackend::with_max_entries(2);
        let now = Utc::now();
        for i in 0..50i64 {
            let expires_at = now + Duration::seconds(60 + i);
            backend
                .put(CacheEntry::new(format!("k{}", i), json!(i), expires_at), now)
                .await?;
            assert!(backend.len().await? <= 2);
        }
        assert!(backend.get("k49").await?.is_some());
        assert!(backend.get("k0").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_eviction_keeps_latest_expiring_entries() -> OrbitResult<()> {
        let backend = InMemoryCacheBackend::with_max_entries(10);
        let now = Utc::now();
        for i in 0..10i64 {
            let expires_at = now + Duration::seconds(100 - i);
            backend
                .put(CacheEntry::new(format!("k{}", i), json!(i), expires_at), now)
                .await?;
        }
        // Full: the next new key trims down to the low-water mark first.
        backend
            .put(CacheEntry::new("new", json!("n"), now + Duration::seconds(500)), now)
            .await?;
        assert_eq!(backend.len().await?, 9);
        assert!(backend.get("k0").await?.is_some());
        assert!(backend.get("k8").await?.is_none());
        assert!(backend.get("k9").await?.is_none());
        assert!(backend.get("new").await?.is_some());

        // Replacing an existing key never evicts.
        backend.put(CacheEntry::new("k0", json!("again"), now + Duration::seconds(100)), now).await?;
        assert_eq!(backend.len().await?, 9);
        Ok(())
    }
}
