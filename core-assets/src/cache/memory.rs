//! # Memory Cache Tier
//!
//! Process-lifetime LRU store bounded by a total cost ceiling.
//!
//! ## Eviction
//!
//! Every entry carries a cost (its byte size). When a save would push the
//! total over the ceiling, least-recently-used entries are evicted until the
//! new entry fits. An entry that on its own exceeds the ceiling is not stored.
//! Entries never expire by time.
//!
//! Eviction order depends only on the sequence of saves and retrieves, so it is
//! deterministic for a given access pattern.
//!
//! ## Admission
//!
//! A cache may be given an admission rule. Values it rejects are never stored,
//! and they still displace an older entry for the same key. File locations use
//! [`MemoryCache::scoped_to`] so only paths inside the disk cache directory
//! are ever handed out; a download still waiting to be moved into place is
//! not.

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::key::CacheKey;
use super::operator::{CacheOperator, CacheValue};

pub use core_runtime::config::DEFAULT_MEMORY_COST_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryCacheStats {
    pub entries: usize,
    pub total_cost: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Decides whether a value may enter the cache.
pub type Admission<V> = Arc<dyn Fn(&V) -> bool + Send + Sync>;

struct Entry<V> {
    value: V,
    cost: usize,
    generation: u64,
}

struct Inner<V> {
    entries: LruCache<String, Entry<V>>,
    total_cost: usize,
    next_generation: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<V> Inner<V> {
    fn remove(&mut self, key: &str) -> Option<Entry<V>> {
        let entry = self.entries.pop(key)?;
        self.total_cost -= entry.cost;
        Some(entry)
    }
}

/// L1 cache tier.
pub struct MemoryCache<V> {
    cost_limit: usize,
    admission: Option<Admission<V>>,
    inner: Mutex<Inner<V>>,
}

impl<V: CacheValue> MemoryCache<V> {
    pub fn new(cost_limit: usize) -> Self {
        Self {
            cost_limit,
            admission: None,
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                total_cost: 0,
                next_generation: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    /// Only values accepted by `admit` are stored.
    pub fn with_admission<F>(mut self, admit: F) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        self.admission = Some(Arc::new(admit));
        self
    }

    pub fn cost_limit(&self) -> usize {
        self.cost_limit
    }

    /// Inserts `value`, evicting least-recently-used entries as needed.
    ///
    /// Returns `false` when the value was rejected by the admission rule or
    /// alone exceeds the ceiling. Any previous value for the key is replaced
    /// either way.
    pub fn insert(&self, key: &CacheKey, value: V) -> bool {
        let admitted = self.admission.as_ref().map_or(true, |admit| admit(&value));
        // Costs of file values come from the filesystem; measure before locking.
        let cost = if admitted { value.cost() } else { 0 };
        let mut inner = self.inner.lock();

        inner.remove(key.value());

        if !admitted {
            debug!(key = %key, "Value rejected by memory cache admission");
            return false;
        }

        if cost > self.cost_limit {
            debug!(
                key = %key,
                cost,
                limit = self.cost_limit,
                "Value exceeds memory cost ceiling, not cached"
            );
            return false;
        }

        while inner.total_cost + cost > self.cost_limit {
            match inner.entries.pop_lru() {
                Some((evicted_key, evicted)) => {
                    inner.total_cost -= evicted.cost;
                    inner.evictions += 1;
                    debug!(key = %evicted_key, cost = evicted.cost, "Evicted from memory cache");
                }
                None => break,
            }
        }

        let generation = inner.next_generation;
        inner.next_generation += 1;
        inner.entries.put(
            key.value().to_string(),
            Entry {
                value,
                cost,
                generation,
            },
        );
        inner.total_cost += cost;

        debug!(
            key = %key,
            cost,
            total_cost = inner.total_cost,
            "Stored in memory cache"
        );
        true
    }

    /// Looks up `key`, marking it most recently used.
    ///
    /// Entries that are no longer live are dropped and reported as a miss.
    /// Liveness is checked without holding the lock; a stale entry is only
    /// dropped if nobody replaced it in the meantime.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let found = {
            let mut inner = self.inner.lock();
            let found = inner
                .entries
                .get(key.value())
                .map(|entry| (entry.value.clone(), entry.generation));
            if found.is_none() {
                inner.misses += 1;
            }
            found
        };
        let (value, generation) = found?;

        let live = value.is_live();

        let mut inner = self.inner.lock();
        if live {
            inner.hits += 1;
            return Some(value);
        }

        let unchanged = inner
            .entries
            .peek(key.value())
            .is_some_and(|entry| entry.generation == generation);
        if unchanged {
            inner.remove(key.value());
            debug!(key = %key, "Dropped stale memory cache entry");
        }
        inner.misses += 1;
        None
    }

    pub fn remove(&self, key: &CacheKey) -> Option<V> {
        self.inner.lock().remove(key.value()).map(|entry| entry.value)
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.total_cost = 0;
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().entries.contains(key.value())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_cost(&self) -> usize {
        self.inner.lock().total_cost
    }

    pub fn stats(&self) -> MemoryCacheStats {
        let inner = self.inner.lock();
        MemoryCacheStats {
            entries: inner.entries.len(),
            total_cost: inner.total_cost,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }
}

impl MemoryCache<PathBuf> {
    /// Admits only locations inside `directory`.
    pub fn scoped_to(self, directory: impl AsRef<Path>) -> Self {
        let directory = directory.as_ref().to_path_buf();
        self.with_admission(move |path: &PathBuf| path.starts_with(&directory))
    }
}

impl<V: CacheValue> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_COST_LIMIT)
    }
}

#[async_trait]
impl<V: CacheValue> CacheOperator<V> for MemoryCache<V> {
    async fn save(&self, value: V, key: &CacheKey) {
        self.insert(key, value);
    }

    async fn retrieve(&self, key: &CacheKey) -> Option<V> {
        self.get(key)
    }
}
