//! Named cache registry that hands out transaction-aware caches
//!
//! Applications register their underlying caches once and look them up by
//! name. Caches selected by `TxCacheConfig` come back wrapped in a
//! `TxAwareCache` bound to the manager's transaction context; the others
//! come back as registered.
//!
//! One decorator is created per name and reused, so every lookup of a
//! transactional cache shares the same write buffer within a transaction.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, info};
use txcache_concurrency::TxAwareCache;
use txcache_core::{Cache, CacheError, CacheResult, TransactionContext};

use crate::config::TxCacheConfig;

/// Registry of named caches with per-name transactional decoration
pub struct TxAwareCacheManager<K, V> {
    context: Arc<dyn TransactionContext>,
    config: TxCacheConfig,
    /// Registered caches, undecorated
    caches: DashMap<String, Arc<dyn Cache<K, V>>>,
    /// Memoized decorators for transactional caches
    decorated: DashMap<String, Arc<dyn Cache<K, V>>>,
}

impl<K, V> TxAwareCacheManager<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a manager with no registered cache
    ///
    /// # Errors
    /// Returns `CacheError::InvalidConfig` if `config` fails validation.
    pub fn new(context: Arc<dyn TransactionContext>, config: TxCacheConfig) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self {
            context,
            config,
            caches: DashMap::new(),
            decorated: DashMap::new(),
        })
    }

    /// Register an underlying cache under its own name
    ///
    /// # Errors
    /// Returns `CacheError::CacheAlreadyRegistered` if the name is taken.
    pub fn register(&self, cache: Arc<dyn Cache<K, V>>) -> CacheResult<()> {
        let name = cache.name().to_string();
        match self.caches.entry(name) {
            Entry::Occupied(existing) => Err(CacheError::CacheAlreadyRegistered(existing.key().clone())),
            Entry::Vacant(slot) => {
                info!(
                    target: "txcache::manager",
                    cache = %slot.key(),
                    transactional = self.config.is_transactional(slot.key()),
                    "Cache registered"
                );
                slot.insert(cache);
                Ok(())
            }
        }
    }

    /// Look up a cache by name
    ///
    /// Transactional caches are returned decorated; the decorator is created
    /// on first lookup and reused afterwards.
    ///
    /// # Errors
    /// Returns `CacheError::CacheNotFound` for an unregistered name.
    pub fn get_cache(&self, name: &str) -> CacheResult<Arc<dyn Cache<K, V>>> {
        let cache = self
            .caches
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| CacheError::CacheNotFound(name.to_string()))?;

        if !self.config.is_transactional(name) {
            return Ok(cache);
        }

        let decorated = self
            .decorated
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(target: "txcache::manager", cache = %name, "Decorating cache");
                Arc::new(TxAwareCache::new(cache, Arc::clone(&self.context)))
            })
            .value()
            .clone();
        Ok(decorated)
    }

    /// Check if the named cache is handed out decorated
    pub fn is_transactional(&self, name: &str) -> bool {
        self.config.is_transactional(name)
    }

    /// Names of all registered caches, sorted
    pub fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Active configuration
    pub fn config(&self) -> &TxCacheConfig {
        &self.config
    }
}

impl<K, V> std::fmt::Debug for TxAwareCacheManager<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxAwareCacheManager")
            .field("config", &self.config)
            .field("caches", &self.caches.len())
            .field("decorated", &self.decorated.len())
            .finish()
    }
}
