//! Cache Store Module
//!
//! Main cache engine: HashMap storage with TTL expiration and lazy purge.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use crate::cache::{CacheEntry, CacheKey, CacheStats, Clock, KeyPattern, SystemClock};
use crate::error::{CacheError, Result};
use crate::http::Response;

// == Cache Store ==
/// Single-owner cache storage with TTL support.
///
/// Expired entries are never returned or counted. They are dropped the next
/// time their key is read, or by an explicit `purge_expired`. There is no
/// capacity limit.
#[derive(Debug)]
pub struct CacheStore<V = Response> {
    /// Key-value storage
    entries: HashMap<CacheKey, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// Time source for expiry
    clock: Arc<dyn Clock>,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store on the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            clock,
        }
    }

    // == Set ==
    /// Stores a value that expires `ttl` from now.
    ///
    /// An existing entry for the key is replaced and its TTL reset.
    ///
    /// # Arguments
    /// * `key` - The key to store under
    /// * `value` - The value to store
    /// * `ttl` - Time to live, must be greater than zero; sub-millisecond
    ///   values are rounded up to 1 ms
    ///
    /// # Errors
    /// `InvalidTtl` for a zero TTL; the store is left unchanged.
    pub fn set(&mut self, key: CacheKey, value: V, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl(ttl));
        }

        let entry = CacheEntry::new(value, ttl, self.clock.now_ms());
        self.entries.insert(key, entry);
        Ok(())
    }

    // == Get ==
    /// Retrieves a clone of the value if present and not expired.
    ///
    /// An expired entry is removed by this call and reported as absent.
    pub fn get(&mut self, key: &CacheKey) -> Option<V> {
        let now = self.clock.now_ms();

        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                trace!("Purged expired entry {}", key);
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Contains ==
    /// Returns true if a live entry exists. Does not purge or touch stats.
    pub fn contains(&self, key: &CacheKey) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// Returns true if a live entry was removed; absent keys are a no-op.
    pub fn delete(&mut self, key: &CacheKey) -> bool {
        let now = self.clock.now_ms();
        match self.entries.remove(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.stats.record_invalidations(1);
                true
            }
            Some(_) => {
                self.stats.record_expirations(1);
                false
            }
            None => false,
        }
    }

    // == Clear ==
    /// Removes every entry. Returns the number of live entries removed.
    pub fn clear(&mut self) -> usize {
        let keys: Vec<CacheKey> = self.entries.keys().cloned().collect();
        self.remove_all(keys)
    }

    // == Invalidate By Pattern ==
    /// Removes every entry whose key matches `pattern`.
    ///
    /// Matching keys are collected first and removed afterwards. Returns the
    /// number of live entries removed.
    pub fn invalidate_by_pattern(&mut self, pattern: &KeyPattern) -> usize {
        let keys: Vec<CacheKey> = self
            .entries
            .keys()
            .filter(|key| pattern.matches(key.as_str()))
            .cloned()
            .collect();
        self.remove_all(keys)
    }

    /// Removes entries matching `pattern`, or everything when `None`.
    pub fn invalidate(&mut self, pattern: Option<&KeyPattern>) -> usize {
        match pattern {
            Some(pattern) => self.invalidate_by_pattern(pattern),
            None => self.clear(),
        }
    }

    // == Purge Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - self.entries.len();
        self.stats.record_expirations(removed);
        removed
    }

    // == Keys ==
    /// Returns live keys in sorted order.
    pub fn keys(&self) -> Vec<CacheKey> {
        let now = self.clock.now_ms();
        let mut keys: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.len());
        stats
    }

    // == Length ==
    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now_ms();
        self.entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    // == Is Empty ==
    /// Returns true if no live entries remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove_all(&mut self, keys: Vec<CacheKey>) -> usize {
        let now = self.clock.now_ms();
        let mut live = 0;
        let mut expired = 0;

        for key in keys {
            if let Some(entry) = self.entries.remove(&key) {
                if entry.is_expired(now) {
                    expired += 1;
                } else {
                    live += 1;
                }
            }
        }

        self.stats.record_invalidations(live);
        self.stats.record_expirations(expired);
        live
    }
}

impl<V: Clone> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
