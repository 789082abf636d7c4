//! Transaction-aware cache decorator
//!
//! `TxAwareCache` wraps any `Cache` and exposes the same capability. Outside
//! a transaction every call goes straight to the wrapped cache. Inside one,
//! mutations are recorded in a `WriteBuffer` bound to the transaction and
//! reach the wrapped cache only if the transaction commits; reads see the
//! transaction's own pending mutations.
//!
//! # Binding
//!
//! The buffer is created on the first operation a transaction performs on
//! the cache (reads included) and bound under the wrapped cache's identity,
//! together with a completion callback that flushes or discards it. Caches
//! a transaction never touches cost nothing.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use txcache_concurrency::{TransactionManager, TxAwareCache};
//! use txcache_core::Cache;
//! use txcache_storage::InMemoryCache;
//!
//! let manager = Arc::new(TransactionManager::new());
//! let backend = Arc::new(InMemoryCache::<String, i64>::new("users"));
//! let cache = TxAwareCache::new(backend.clone(), manager.clone());
//!
//! manager.transaction(|| {
//!     cache.put("alice".to_string(), 1)?;
//!     // Visible inside the transaction only
//!     assert_eq!(cache.get(&"alice".to_string())?, Some(1));
//!     assert_eq!(backend.get(&"alice".to_string())?, None);
//!     Ok(())
//! })?;
//!
//! assert_eq!(backend.get(&"alice".to_string())?, Some(1));
//! # Ok::<(), txcache_core::CacheError>(())
//! ```

use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;
use txcache_core::{Cache, CacheError, CacheResult, Resource, ResourceId, TransactionContext};

use crate::synchronization::{BufferSynchronization, SharedBuffer};
use crate::write_buffer::WriteBuffer;

/// Cache decorator that defers mutations to transaction commit
pub struct TxAwareCache<K, V> {
    /// Wrapped cache, target of pass-through calls and commit flushes
    cache: Arc<dyn Cache<K, V>>,
    /// Source of transaction state for the calling thread
    context: Arc<dyn TransactionContext>,
    /// Identity of `cache`, key of the bound write buffer
    id: ResourceId,
}

impl<K, V> TxAwareCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Wrap `cache`, consulting `context` for transaction state
    ///
    /// Decorators wrapping the same `Arc` share one write buffer per
    /// transaction.
    pub fn new(cache: Arc<dyn Cache<K, V>>, context: Arc<dyn TransactionContext>) -> Self {
        let id = ResourceId::of(&cache);
        Self { cache, context, id }
    }

    /// The wrapped cache
    pub fn inner(&self) -> &Arc<dyn Cache<K, V>> {
        &self.cache
    }

    /// Identity under which write buffers for this cache are bound
    pub fn resource_id(&self) -> ResourceId {
        self.id
    }

    /// Look up the write buffer of the current transaction, creating and
    /// binding it on first use
    ///
    /// Returns `None` when no transaction is active.
    fn buffer(&self) -> CacheResult<Option<Arc<SharedBuffer<K, V>>>> {
        if !self.context.is_transaction_active() {
            return Ok(None);
        }

        if let Some(resource) = self.context.get_resource(self.id) {
            return resource
                .downcast::<SharedBuffer<K, V>>()
                .map(Some)
                .map_err(|_| CacheError::ResourceTypeMismatch(self.id));
        }

        let buffer: Arc<SharedBuffer<K, V>> = Arc::new(Mutex::new(WriteBuffer::new()));
        self.context
            .bind_resource(self.id, Arc::clone(&buffer) as Resource)?;
        self.context
            .register_synchronization(Box::new(BufferSynchronization::new(
                Arc::clone(&buffer),
                Arc::clone(&self.cache),
            )))?;

        debug!(
            target: "txcache::buffer",
            cache = %self.cache.name(),
            resource = %self.id,
            "Write buffer bound to transaction"
        );
        Ok(Some(buffer))
    }
}

impl<K, V> Cache<K, V> for TxAwareCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        self.cache.name()
    }

    fn get(&self, key: &K) -> CacheResult<Option<V>> {
        match self.buffer()? {
            None => self.cache.get(key),
            Some(buffer) => buffer.lock().get(key, || self.cache.get(key)),
        }
    }

    fn put(&self, key: K, value: V) -> CacheResult<()> {
        match self.buffer()? {
            None => self.cache.put(key, value),
            Some(buffer) => {
                buffer.lock().put(key, value);
                Ok(())
            }
        }
    }

    /// Outside a transaction this is a check-then-put against the wrapped
    /// cache: best effort, not atomic with respect to other callers.
    fn put_if_absent(&self, key: K, value: V) -> CacheResult<Option<V>> {
        match self.buffer()? {
            None => match self.cache.get(&key)? {
                Some(existing) => Ok(Some(existing)),
                None => {
                    self.cache.put(key, value)?;
                    Ok(None)
                }
            },
            Some(buffer) => {
                let cache = &self.cache;
                let lookup = key.clone();
                buffer
                    .lock()
                    .put_if_absent(key, value, move || cache.get(&lookup))
            }
        }
    }

    fn evict(&self, key: &K) -> CacheResult<()> {
        match self.buffer()? {
            None => self.cache.evict(key),
            Some(buffer) => {
                buffer.lock().evict(key.clone());
                Ok(())
            }
        }
    }

    fn clear(&self) -> CacheResult<()> {
        match self.buffer()? {
            None => self.cache.clear(),
            Some(buffer) => {
                buffer.lock().clear();
                Ok(())
            }
        }
    }
}

impl<K, V> std::fmt::Debug for TxAwareCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxAwareCache")
            .field("cache", &self.cache.name())
            .field("resource", &self.id)
            .finish()
    }
}
