//! In-process TTL cache with LRU eviction
//!
//! The memory tier of the interpretation cache: bounded by entry count,
//! evicting the least-recently-used entry at capacity, with lazy per-entry
//! expiry. All operations complete synchronously under one lock acquisition,
//! so the structure is safe to share across tasks and threads.

use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::time::Duration;

/// A cached value with its expiry deadline
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: Option<DateTime<Utc>>,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Option<Duration>) -> Self {
        let expires_at = ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| Utc::now() + ttl);
        Self { value, expires_at }
    }

    /// An entry is visible only while `now < expires_at`
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }
}

/// Counters for cache effectiveness monitoring
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expired: u64,
}

/// Bounded key-value cache with per-entry TTL and LRU eviction.
///
/// Expiry is lazy: `get` deletes an expired entry on sight, and a periodic
/// [`cleanup`](TtlCache::cleanup) sweep bounds memory, but correctness never
/// depends on the sweep running.
#[derive(Debug)]
pub struct TtlCache<V> {
    inner: Mutex<Inner<V>>,
    default_ttl: Option<Duration>,
}

#[derive(Debug)]
struct Inner<V> {
    entries: LruCache<String, CacheEntry<V>>,
    stats: CacheStats,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize, default_ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to >= 1");
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
            default_ttl,
        }
    }

    /// Get a live value, refreshing its recency. Expired entries are deleted
    /// on sight and reported as misses.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        let lookup = inner.entries.get(key).map(|entry| {
            if entry.is_expired() {
                None
            } else {
                Some(entry.value.clone())
            }
        });
        match lookup {
            Some(Some(value)) => {
                inner.stats.hits += 1;
                Some(value)
            }
            Some(None) => {
                inner.entries.pop(key);
                inner.stats.expired += 1;
                inner.stats.misses += 1;
                None
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// Whether a live entry exists for `key`, without touching recency
    pub fn has(&self, key: &str) -> bool {
        let inner = self.inner.lock();
        inner
            .entries
            .peek(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Insert a value. Replacing an existing key does not count as an
    /// eviction; inserting a new key at capacity evicts exactly the
    /// least-recently-used entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let entry = CacheEntry::new(value, ttl.or(self.default_ttl));
        let mut inner = self.inner.lock();
        let evicting = inner.entries.len() == inner.entries.cap().get()
            && !inner.entries.contains(key.as_str());
        inner.entries.put(key, entry);
        if evicting {
            inner.stats.evictions += 1;
        }
    }

    /// Remove an entry, returning whether one was present
    pub fn delete(&self, key: &str) -> bool {
        self.inner.lock().entries.pop(key).is_some()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Purge expired entries, returning how many were removed
    pub fn cleanup(&self) -> usize {
        let mut inner = self.inner.lock();
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            inner.entries.pop(key);
        }
        inner.stats.expired += expired.len() as u64;
        expired.len()
    }

    /// Number of resident entries, expired or not
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the hit/miss/eviction counters
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }
}
