//! Core traits for the cache and transaction abstractions
//!
//! This module defines the seams of the system:
//! - `Cache`: the key-value capability that is both consumed (the wrapped
//!   cache) and exposed (the transaction-aware decorator)
//! - `TransactionContext`: the collaborator that knows whether the caller
//!   runs inside a transaction and holds resources bound to it
//! - `TransactionSynchronization`: a callback fired once when a
//!   transaction finishes

use crate::error::{CacheError, CacheResult};
use crate::types::{Resource, ResourceId, TransactionOutcome};

/// Key-value cache abstraction
///
/// Implementations must be safe to call concurrently from multiple threads
/// (requires Send + Sync). Absence is reported as `Ok(None)`; errors are
/// reserved for backend failures.
pub trait Cache<K, V>: Send + Sync {
    /// Name of this cache
    fn name(&self) -> &str;

    /// Get the value cached for `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get(&self, key: &K) -> CacheResult<Option<V>>;

    /// Associate `value` with `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn put(&self, key: K, value: V) -> CacheResult<()>;

    /// Store `value` only if no value is cached for `key`
    ///
    /// Returns the value already present (which is left untouched), or
    /// `None` if the new value was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn put_if_absent(&self, key: K, value: V) -> CacheResult<Option<V>>;

    /// Remove the value cached for `key`, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn evict(&self, key: &K) -> CacheResult<()>;

    /// Remove every entry
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn clear(&self) -> CacheResult<()>;
}

/// Typed retrieval on top of any [`Cache`]
///
/// # Example
///
/// ```
/// use txcache_core::{Cache, CacheExt, CacheResult, Value};
/// # use std::collections::HashMap;
/// # use std::sync::Mutex;
/// # struct Map(Mutex<HashMap<String, Value>>);
/// # impl Cache<String, Value> for Map {
/// #     fn name(&self) -> &str { "map" }
/// #     fn get(&self, k: &String) -> CacheResult<Option<Value>> { Ok(self.0.lock().unwrap().get(k).cloned()) }
/// #     fn put(&self, k: String, v: Value) -> CacheResult<()> { self.0.lock().unwrap().insert(k, v); Ok(()) }
/// #     fn put_if_absent(&self, k: String, v: Value) -> CacheResult<Option<Value>> { unimplemented!() }
/// #     fn evict(&self, k: &String) -> CacheResult<()> { self.0.lock().unwrap().remove(k); Ok(()) }
/// #     fn clear(&self) -> CacheResult<()> { self.0.lock().unwrap().clear(); Ok(()) }
/// # }
/// # let cache = Map(Mutex::new(HashMap::new()));
/// cache.put("hits".to_string(), Value::Int(3))?;
/// let hits: Option<i64> = cache.get_as(&"hits".to_string())?;
/// assert_eq!(hits, Some(3));
/// assert!(cache.get_as::<String>(&"hits".to_string()).is_err());
/// # Ok::<(), txcache_core::CacheError>(())
/// ```
pub trait CacheExt<K, V>: Cache<K, V> {
    /// Get the value for `key` converted to `T`
    ///
    /// # Errors
    ///
    /// Returns `CacheError::TypeMismatch` if the cached value cannot be
    /// converted, or the backend error if the lookup fails.
    fn get_as<T>(&self, key: &K) -> CacheResult<Option<T>>
    where
        T: TryFrom<V>,
    {
        match self.get(key)? {
            None => Ok(None),
            Some(value) => T::try_from(value)
                .map(Some)
                .map_err(|_| CacheError::type_mismatch::<T>()),
        }
    }
}

impl<K, V, C: Cache<K, V> + ?Sized> CacheExt<K, V> for C {}

/// Callback fired exactly once when a transaction finishes
///
/// Taking `self: Box<Self>` consumes the callback, so it cannot run twice.
pub trait TransactionSynchronization: Send + Sync {
    /// Invoked after the transaction outcome is known
    ///
    /// # Errors
    ///
    /// Returns an error if the post-completion work fails. The transaction
    /// outcome itself is not affected.
    fn after_completion(self: Box<Self>, outcome: TransactionOutcome) -> CacheResult<()>;
}

/// Transaction context seen by the calling thread of execution
///
/// Tells whether a transaction is active for the caller, stores resources
/// bound to that transaction and accepts completion callbacks. All methods
/// act on the caller's current transaction.
pub trait TransactionContext: Send + Sync {
    /// Check if the caller currently runs inside a transaction
    fn is_transaction_active(&self) -> bool;

    /// Get the resource bound under `id` in the current transaction
    fn get_resource(&self, id: ResourceId) -> Option<Resource>;

    /// Bind `resource` under `id` for the rest of the current transaction
    ///
    /// # Errors
    ///
    /// Returns `CacheError::NoActiveTransaction` outside a transaction and
    /// `CacheError::ResourceAlreadyBound` if `id` is taken.
    fn bind_resource(&self, id: ResourceId, resource: Resource) -> CacheResult<()>;

    /// Register a callback for the end of the current transaction
    ///
    /// # Errors
    ///
    /// Returns `CacheError::NoActiveTransaction` outside a transaction.
    fn register_synchronization(
        &self,
        synchronization: Box<dyn TransactionSynchronization>,
    ) -> CacheResult<()>;
}
