//! Compute-if-absent response cache with per-call TTLs.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use orbitdeck_core::{CacheKey, OrbitResult};
use serde_json::Value;

use super::clock::{Clock, SystemClock};
use super::memory::InMemoryCacheBackend;
use super::traits::{CacheBackend, CacheEntry, CacheStats};

/// Receives one notification per cache lookup. Used for metrics.
pub trait CacheObserver: Send + Sync {
    fn on_lookup(&self, endpoint: &str, hit: bool);
}

/// Process-wide response cache shared by every aggregator.
///
/// Backend failures never reach callers: a failed read counts as a miss and
/// a failed write only loses the entry. Two concurrent misses on the same key
/// may both compute; the later write wins.
pub struct ResponseCache {
    backend: Arc<dyn CacheBackend>,
    clock: Arc<dyn Clock>,
    observer: Option<Arc<dyn CacheObserver>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(backend: Arc<dyn CacheBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            observer: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// In-memory backend on the system clock.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCacheBackend::new()), Arc::new(SystemClock))
    }

    pub fn with_observer(mut self, observer: Arc<dyn CacheObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Return the live value under `key`, or run `compute` once, store its
    /// result for `ttl` and return it.
    pub async fn get_or_compute<F, Fut>(&self, key: &CacheKey, ttl: Duration, compute: F) -> Value
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Value> + Send,
    {
        let rendered = key.render();
        let now = self.clock.now();
        if let Some(value) = self.lookup(key.endpoint(), &rendered, now).await {
            return value;
        }

        let value = compute().await;
        self.store(rendered, value.clone(), ttl).await;
        value
    }

    /// Like [`get_or_compute`](Self::get_or_compute), but only `Ok` results
    /// are stored. An `Err` is returned to the caller and the next lookup
    /// computes again.
    pub async fn try_get_or_compute<F, Fut, E>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Value, E>> + Send,
    {
        let rendered = key.render();
        let now = self.clock.now();
        if let Some(value) = self.lookup(key.endpoint(), &rendered, now).await {
            return Ok(value);
        }

        let value = compute().await?;
        self.store(rendered, value.clone(), ttl).await;
        Ok(value)
    }

    /// Drop the entry under `key`.
    pub async fn invalidate(&self, key: &CacheKey) -> OrbitResult<bool> {
        self.backend.remove(&key.render()).await
    }

    /// Drop every expired entry.
    pub async fn purge_expired(&self) -> OrbitResult<u64> {
        self.backend.purge_expired(self.clock.now()).await
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.backend.len().await.unwrap_or(0),
        }
    }

    async fn lookup(&self, endpoint: &str, key: &str, now: DateTime<Utc>) -> Option<Value> {
        let found = match self.backend.get(key).await {
            Ok(Some(entry)) if entry.is_live_at(now) => Some(entry.value),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read failed, computing");
                None
            }
        };

        let hit = found.is_some();
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        tracing::debug!(key, hit, "cache lookup");
        if let Some(observer) = &self.observer {
            observer.on_lookup(endpoint, hit);
        }
        found
    }

    async fn store(&self, key: String, value: Value, ttl: Duration) {
        let now = self.clock.now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        if let Err(e) = self.backend.put(CacheEntry::new(key.clone(), value, expires_at), now).await {
            tracing::warn!(key, error = %e, "cache write failed");
        }
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
