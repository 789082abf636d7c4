//! txcache - transaction-aware caching
//!
//! Wraps any [`Cache`] so that mutations made inside a transaction are
//! buffered per (cache, transaction), visible to that transaction's own
//! reads, applied to the cache on commit and discarded on rollback.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use txcache::{Cache, InMemoryCache, TransactionManager, TxAwareCache};
//!
//! let manager = Arc::new(TransactionManager::new());
//! let backend = Arc::new(InMemoryCache::<String, i64>::new("orders"));
//! let cache: TxAwareCache<String, i64> = TxAwareCache::new(backend.clone(), manager.clone());
//!
//! manager.transaction(|| {
//!     cache.put("a".to_string(), 1)?;
//!     assert_eq!(backend.get(&"a".to_string())?, None);
//!     Ok(())
//! })?;
//!
//! assert_eq!(backend.get(&"a".to_string())?, Some(1));
//! # Ok::<(), txcache::CacheError>(())
//! ```
//!
//! # Architecture
//!
//! - `txcache-core`: [`Cache`] and [`TransactionContext`] contracts, errors, [`Value`]
//! - `txcache-storage`: [`InMemoryCache`] backend
//! - `txcache-concurrency`: [`WriteBuffer`], [`TxAwareCache`], [`TransactionManager`]
//! - `txcache-engine`: [`TxCacheConfig`] and [`TxAwareCacheManager`]

pub use txcache_concurrency::{
    BufferSynchronization, BufferedOperation, PendingOperations, SharedBuffer, Transaction,
    TransactionManager, TransactionMetrics, TxAwareCache, WriteBuffer,
};
pub use txcache_core::{
    Cache, CacheError, CacheExt, CacheResult, Resource, ResourceId, TransactionContext,
    TransactionOutcome, TransactionSynchronization, Value,
};
pub use txcache_engine::{TxAwareCacheManager, TxCacheConfig, CONFIG_FILE_NAME};
pub use txcache_storage::InMemoryCache;
