//! LRU memoization map.

use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use tally_core::constants::DEFAULT_MEMO_CAPACITY;

/// Memo configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoConfig {
    /// Maximum number of entries; 0 is treated as 1
    pub capacity: usize,
}

impl MemoConfig {
    /// Creates a config with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    fn capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MEMO_CAPACITY,
        }
    }
}

struct Inner<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
    hits: u64,
    misses: u64,
}

/// Bounded memoization map with least-recently-used eviction.
///
/// Thread-safe. A lookup counts as a use, so frequently read entries survive
/// eviction. Values are cloned out; wrap large values in `Arc`.
pub struct MemoCache<K: Hash + Eq, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K: Hash + Eq, V: Clone> MemoCache<K, V> {
    /// Creates a cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(MemoConfig::default())
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(config: MemoConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(config.capacity()),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Gets a memoized value, marking it most recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut inner = self.inner.lock();
        let found = inner.entries.get(key).cloned();
        match found {
            Some(value) => {
                inner.hits += 1;
                Some(value)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Returns true if `key` is memoized, without touching recency or stats.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().entries.contains(key)
    }

    /// Memoizes a value, evicting the least recently used entry when full.
    ///
    /// Returns the evicted key, if any.
    pub fn insert(&self, key: K, value: V) -> Option<K> {
        let mut inner = self.inner.lock();
        let displaced = inner.entries.push(key, value);
        match displaced {
            Some((evicted, _)) if !inner.entries.contains(&evicted) => Some(evicted),
            _ => None,
        }
    }

    /// Removes a memoized entry.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().entries.pop(key)
    }

    /// Clears all entries. Statistics are kept.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Returns the number of memoized entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> MemoStats {
        let inner = self.inner.lock();
        MemoStats {
            entries: inner.entries.len(),
            capacity: inner.entries.cap().get(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

impl<K: Hash + Eq, V: Clone> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Memo statistics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoStats {
    /// Current entries
    pub entries: usize,
    /// Maximum capacity
    pub capacity: usize,
    /// Lookups that found a value
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
}

impl MemoStats {
    /// Fraction of lookups that hit, 0.0 when there were none.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
