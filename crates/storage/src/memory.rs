//! In-memory cache backend
//!
//! DashMap-backed key-value cache.
//!
//! # Design
//!
//! - DashMap: sharded by default, reads only take a shard read lock
//! - `put_if_absent` goes through the entry API, so it is atomic with respect
//!   to other callers of this cache
//! - `clear` is not atomic across shards; concurrent writers may survive it

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::hash::Hash;
use txcache_core::{Cache, CacheResult};

/// Named in-memory cache
///
/// # Example
///
/// ```
/// use txcache_core::Cache;
/// use txcache_storage::InMemoryCache;
///
/// let cache = InMemoryCache::new("users");
/// cache.put("alice".to_string(), 1)?;
/// assert_eq!(cache.get(&"alice".to_string())?, Some(1));
/// # Ok::<(), txcache_core::CacheError>(())
/// ```
pub struct InMemoryCache<K, V>
where
    K: Eq + Hash,
{
    name: String,
    entries: DashMap<K, V>,
}

impl<K, V> InMemoryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
        }
    }

    /// Create an empty cache sized for `capacity` entries
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::with_capacity(capacity),
        }
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if a value is cached for `key`
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Copy of every entry
    ///
    /// Not a consistent point-in-time view under concurrent writes.
    pub fn snapshot(&self) -> HashMap<K, V> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl<K, V> Cache<K, V> for InMemoryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &K) -> CacheResult<Option<V>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn put(&self, key: K, value: V) -> CacheResult<()> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn put_if_absent(&self, key: K, value: V) -> CacheResult<Option<V>> {
        match self.entries.entry(key) {
            Entry::Occupied(existing) => Ok(Some(existing.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(None)
            }
        }
    }

    fn evict(&self, key: &K) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> CacheResult<()> {
        tracing::trace!(target: "txcache::storage", cache = %self.name, entries = self.entries.len(), "Clearing cache");
        self.entries.clear();
        Ok(())
    }
}

impl<K, V> std::fmt::Debug for InMemoryCache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .finish()
    }
}
