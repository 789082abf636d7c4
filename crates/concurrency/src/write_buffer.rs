//! Write buffer for transaction-scoped cache mutations
//!
//! A `WriteBuffer` belongs to exactly one (cache, transaction) pair. It holds
//! every put, evict and clear issued through a transaction-aware cache while
//! the transaction runs, answers reads with the transaction-local view, and
//! is replayed into the underlying cache when the transaction commits.
//!
//! # Read-Your-Writes Semantics
//!
//! When reading a key, the buffer checks in order:
//! 1. **puts**: returns the value buffered by this transaction
//! 2. **evictions**: returns None for a key evicted in this transaction
//! 3. **cleared**: returns None if the transaction cleared the cache
//! 4. **underlying cache**: delegates, without remembering the result
//!
//! # Replay
//!
//! Operations are kept in one ordered log and replayed verbatim at commit.
//! A clear supersedes everything recorded before it, so recording a clear
//! truncates the log to that single entry.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use txcache_core::{Cache, CacheResult};

/// A mutation recorded against the transaction-local view
#[derive(Debug, Clone, PartialEq)]
pub enum BufferedOperation<K, V> {
    /// Store a value for a key
    Put(K, V),
    /// Remove a key
    Evict(K),
    /// Remove every entry
    Clear,
}

impl<K, V> BufferedOperation<K, V> {
    /// Key touched by this operation, `None` for a clear
    pub fn key(&self) -> Option<&K> {
        match self {
            BufferedOperation::Put(key, _) | BufferedOperation::Evict(key) => Some(key),
            BufferedOperation::Clear => None,
        }
    }
}

/// Summary of the operations a buffer would replay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingOperations {
    /// Number of buffered put operations
    pub puts: usize,
    /// Number of buffered evict operations
    pub evictions: usize,
    /// Whether a clear is buffered
    pub cleared: bool,
}

impl PendingOperations {
    /// Check if there is nothing to replay
    pub fn is_empty(&self) -> bool {
        self.puts == 0 && self.evictions == 0 && !self.cleared
    }
}

/// Pending cache mutations of one transaction
///
/// `puts` and `evictions` are disjoint: the most recent operation on a key
/// removes it from the other collection.
#[derive(Debug)]
pub struct WriteBuffer<K, V> {
    /// Values buffered by this transaction, visible to its reads
    puts: HashMap<K, V>,
    /// Keys evicted by this transaction, reported as absent to its reads
    evictions: HashSet<K>,
    /// Set once `clear()` has been recorded
    cleared: bool,
    /// Every recorded operation in issuance order (replay source)
    log: Vec<BufferedOperation<K, V>>,
}

impl<K, V> Default for WriteBuffer<K, V> {
    fn default() -> Self {
        Self {
            puts: HashMap::new(),
            evictions: HashSet::new(),
            cleared: false,
            log: Vec::new(),
        }
    }
}

impl<K, V> WriteBuffer<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    // === Read Operations ===

    /// Read `key` through the transaction-local view
    ///
    /// `load` is only called for keys this transaction has not touched, and
    /// its result is not buffered: every such read reaches the underlying
    /// cache again.
    ///
    /// # Errors
    /// Returns whatever error `load` returns.
    pub fn get<F>(&self, key: &K, load: F) -> CacheResult<Option<V>>
    where
        F: FnOnce() -> CacheResult<Option<V>>,
    {
        if let Some(value) = self.puts.get(key) {
            return Ok(Some(value.clone()));
        }
        if self.hides(key) {
            return Ok(None);
        }
        load()
    }

    /// Check if `key` reads as absent without consulting the underlying cache
    fn hides(&self, key: &K) -> bool {
        self.cleared || self.evictions.contains(key)
    }

    // === Write Operations ===

    /// Buffer a put
    ///
    /// # Semantics
    /// - If the key was evicted in this transaction, it no longer is
    /// - Overwrites any previously buffered value (latest value wins)
    pub fn put(&mut self, key: K, value: V) {
        self.evictions.remove(&key);
        self.puts.insert(key.clone(), value.clone());
        self.log.push(BufferedOperation::Put(key, value));
    }

    /// Buffer a put unless a value is visible for `key`
    ///
    /// Returns the visible value, left untouched, or `None` if the put was
    /// buffered. A key evicted or cleared in this transaction counts as
    /// absent; `load` is consulted only for keys the transaction has not
    /// touched.
    ///
    /// # Errors
    /// Returns whatever error `load` returns; nothing is buffered then.
    pub fn put_if_absent<F>(&mut self, key: K, value: V, load: F) -> CacheResult<Option<V>>
    where
        F: FnOnce() -> CacheResult<Option<V>>,
    {
        if let Some(existing) = self.puts.get(&key) {
            return Ok(Some(existing.clone()));
        }
        if !self.hides(&key) {
            if let Some(existing) = load()? {
                return Ok(Some(existing));
            }
        }
        self.put(key, value);
        Ok(None)
    }

    /// Buffer an eviction
    ///
    /// # Semantics
    /// - If the key was put in this transaction, the put is dropped from the view
    /// - Reads of the key return None for the rest of the transaction
    pub fn evict(&mut self, key: K) {
        self.puts.remove(&key);
        self.evictions.insert(key.clone());
        self.log.push(BufferedOperation::Evict(key));
    }

    /// Buffer a clear
    ///
    /// The transaction-local view becomes empty and the log is reset to a
    /// single clear, which is what the earlier operations net out to.
    pub fn clear(&mut self) {
        self.puts.clear();
        self.evictions.clear();
        self.cleared = true;
        self.log.clear();
        self.log.push(BufferedOperation::Clear);
    }

    // === Introspection ===

    /// Keys with a visible buffered value, ordered by their latest put
    pub fn pending_puts(&self) -> Vec<(&K, &V)> {
        self.latest_per_key(|op| match op {
            BufferedOperation::Put(key, value) => Some((key, value)),
            _ => None,
        })
    }

    /// Keys evicted by this transaction, ordered by their latest eviction
    pub fn pending_evictions(&self) -> Vec<&K> {
        self.latest_per_key(|op| match op {
            BufferedOperation::Evict(key) => Some(key),
            _ => None,
        })
    }

    /// Walk the log backwards and keep, for every key, only its latest
    /// operation if `select` accepts it. Result is in log order.
    fn latest_per_key<'a, T, F>(&'a self, select: F) -> Vec<T>
    where
        F: Fn(&'a BufferedOperation<K, V>) -> Option<T>,
    {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for op in self.log.iter().rev() {
            let Some(key) = op.key() else { break };
            if seen.insert(key) {
                if let Some(item) = select(op) {
                    selected.push(item);
                }
            }
        }
        selected.reverse();
        selected
    }

    /// Whether a clear was recorded
    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Recorded operations in replay order
    pub fn operations(&self) -> &[BufferedOperation<K, V>] {
        &self.log
    }

    /// Summary of what a flush would replay
    pub fn pending_operations(&self) -> PendingOperations {
        let mut pending = PendingOperations::default();
        for op in &self.log {
            match op {
                BufferedOperation::Put(..) => pending.puts += 1,
                BufferedOperation::Evict(_) => pending.evictions += 1,
                BufferedOperation::Clear => pending.cleared = true,
            }
        }
        pending
    }

    /// Number of recorded operations
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Check if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    // === Commit ===

    /// Replay every recorded operation against `cache`, in issuance order
    ///
    /// Returns the number of operations applied. Stops at the first failing
    /// operation; the ones before it stay applied and the ones after it are
    /// never attempted.
    ///
    /// # Errors
    /// Returns the first error raised by `cache`.
    pub fn flush<C>(self, cache: &C) -> CacheResult<usize>
    where
        C: Cache<K, V> + ?Sized,
    {
        let mut applied = 0;
        for op in self.log {
            match op {
                BufferedOperation::Put(key, value) => cache.put(key, value)?,
                BufferedOperation::Evict(key) => cache.evict(&key)?,
                BufferedOperation::Clear => cache.clear()?,
            }
            applied += 1;
        }
        Ok(applied)
    }
}
