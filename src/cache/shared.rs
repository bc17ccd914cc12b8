//! Shared Cache Module
//!
//! Cloneable, lock-guarded handle to a `CacheStore` for concurrent callers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{CacheKey, CacheStats, CacheStore, Clock, KeyPattern};
use crate::error::Result;
use crate::http::Response;

// == Shared Cache ==
/// Thread-safe cache handle.
///
/// Each call holds the lock only for one lookup or mutation. Clones share the
/// same store; separate `new` calls give independent caches.
#[derive(Debug)]
pub struct SharedCache<V = Response> {
    inner: Arc<RwLock<CacheStore<V>>>,
}

impl<V> Clone for SharedCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> SharedCache<V> {
    /// Creates an empty cache on the system clock.
    pub fn new() -> Self {
        Self::from_store(CacheStore::new())
    }

    /// Creates an empty cache on the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::from_store(CacheStore::with_clock(clock))
    }

    /// Wraps an existing store.
    pub fn from_store(store: CacheStore<V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Looks up a live value. Takes the write lock because expired entries
    /// are purged and stats are updated.
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        let mut store = self.inner.write().await;
        store.get(key)
    }

    /// Stores `value` under `key` for `ttl`, replacing any existing entry.
    ///
    /// # Errors
    /// `InvalidTtl` for a zero TTL.
    pub async fn set(&self, key: CacheKey, value: V, ttl: Duration) -> Result<()> {
        let mut store = self.inner.write().await;
        store.set(key, value, ttl)
    }

    /// Removes `key`. Returns true if a live entry was removed.
    pub async fn delete(&self, key: &CacheKey) -> bool {
        let mut store = self.inner.write().await;
        store.delete(key)
    }

    /// Returns true if `key` has a live entry. Stats are left untouched.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        let store = self.inner.read().await;
        store.contains(key)
    }

    /// Drops every entry, e.g. at the end of a session.
    pub async fn clear(&self) -> usize {
        let removed = {
            let mut store = self.inner.write().await;
            store.clear()
        };
        info!("Cache cleared: removed {} entries", removed);
        removed
    }

    /// Removes every entry whose key matches `pattern`.
    pub async fn invalidate_by_pattern(&self, pattern: &KeyPattern) -> usize {
        let removed = {
            let mut store = self.inner.write().await;
            store.invalidate_by_pattern(pattern)
        };
        debug!("Invalidated {} entries matching {:?}", removed, pattern);
        removed
    }

    /// Invalidates entries matching `pattern`, or the whole cache for `None`.
    pub async fn invalidate(&self, pattern: Option<&KeyPattern>) -> usize {
        match pattern {
            Some(pattern) => self.invalidate_by_pattern(pattern).await,
            None => self.clear().await,
        }
    }

    /// Sweeps expired entries. Nothing calls this automatically.
    pub async fn purge_expired(&self) -> usize {
        let removed = {
            let mut store = self.inner.write().await;
            store.purge_expired()
        };
        if removed > 0 {
            debug!("Purged {} expired entries", removed);
        }
        removed
    }

    /// Returns live keys in sorted order.
    pub async fn keys(&self) -> Vec<CacheKey> {
        self.inner.read().await.keys()
    }

    /// Returns the number of live entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Returns true if no live entries remain.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Returns a snapshot of the counters and live entry count.
    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }
}

impl<V: Clone> Default for SharedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
