//! In-process transaction manager
//!
//! `TransactionManager` is the stock `TransactionContext`: it associates at
//! most one active transaction with each calling thread, stores the
//! resources bound to it and runs its completion callbacks.
//!
//! The manager is an ordinary object, not process-global state. Decorators
//! receive it explicitly, so independent managers never see each other's
//! transactions and tests can substitute their own context.
//!
//! ## Completion Sequence
//!
//! ```text
//! 1. Detach the transaction scope from the calling thread
//! 2. Release every bound resource
//! 3. Record commit / rollback metrics
//! 4. Run every completion callback with the outcome, in registration order
//! 5. Collect callback failures into CacheError::Completion
//! ```
//!
//! A failing callback does not prevent the others from running: each cache
//! flushes its own buffer independently.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::hash_map;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};
use tracing::{debug, error, warn};
use txcache_core::{
    CacheError, CacheResult, Resource, ResourceId, TransactionContext, TransactionOutcome,
    TransactionSynchronization,
};

/// State of one active transaction
struct TransactionScope {
    txn_id: u64,
    resources: HashMap<ResourceId, Resource>,
    synchronizations: Vec<Box<dyn TransactionSynchronization>>,
}

impl TransactionScope {
    fn new(txn_id: u64) -> Self {
        Self {
            txn_id,
            resources: HashMap::new(),
            synchronizations: Vec::new(),
        }
    }
}

/// Transaction metrics for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionMetrics {
    /// Currently active transactions
    pub active: u64,
    /// Total transactions started
    pub started: u64,
    /// Total transactions committed
    pub committed: u64,
    /// Total transactions rolled back
    pub rolled_back: u64,
}

/// Thread-associated transaction manager
///
/// # Memory Ordering
///
/// The metric counters use Relaxed ordering: they are observational only
/// and do not synchronize any other memory operation.
pub struct TransactionManager {
    /// Active transaction per thread
    scopes: DashMap<ThreadId, TransactionScope>,
    /// Next transaction ID
    next_txn_id: AtomicU64,
    total_started: AtomicU64,
    total_committed: AtomicU64,
    total_rolled_back: AtomicU64,
}

impl TransactionManager {
    /// Create a manager with no active transactions
    pub fn new() -> Self {
        Self {
            scopes: DashMap::new(),
            next_txn_id: AtomicU64::new(1),
            total_started: AtomicU64::new(0),
            total_committed: AtomicU64::new(0),
            total_rolled_back: AtomicU64::new(0),
        }
    }

    /// Begin a transaction on the calling thread
    ///
    /// The returned guard must be committed or rolled back; dropping it
    /// unfinished rolls the transaction back.
    ///
    /// # Errors
    /// Returns `CacheError::TransactionAlreadyActive` if the calling thread
    /// already has an active transaction.
    pub fn begin(&self) -> CacheResult<Transaction<'_>> {
        let thread = thread::current().id();
        match self.scopes.entry(thread) {
            Entry::Occupied(scope) => Err(CacheError::TransactionAlreadyActive(scope.get().txn_id)),
            Entry::Vacant(slot) => {
                let txn_id = self.next_txn_id.fetch_add(1, Ordering::SeqCst);
                slot.insert(TransactionScope::new(txn_id));
                self.total_started.fetch_add(1, Ordering::Relaxed);
                debug!(target: "txcache::txn", txn_id, "Transaction started");
                Ok(Transaction {
                    manager: self,
                    thread,
                    txn_id,
                    finished: false,
                    _thread_bound: PhantomData,
                })
            }
        }
    }

    /// Run `f` inside a transaction
    ///
    /// Commits if `f` returns `Ok`, rolls back if it returns `Err` (or
    /// panics). The closure's error is returned unchanged.
    ///
    /// # Errors
    /// Returns the closure's error, `TransactionAlreadyActive` if the thread
    /// is already in a transaction, or `CacheError::Completion` if a
    /// completion callback failed after commit.
    ///
    /// # Example
    /// ```ignore
    /// manager.transaction(|| {
    ///     cache.put(key, value)?;
    ///     Ok(())
    /// })?;
    /// ```
    pub fn transaction<F, T>(&self, f: F) -> CacheResult<T>
    where
        F: FnOnce() -> CacheResult<T>,
    {
        let txn = self.begin()?;
        match f() {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_error) = txn.rollback() {
                    warn!(
                        target: "txcache::txn",
                        error = %rollback_error,
                        "Rollback callbacks failed after closure error"
                    );
                }
                Err(e)
            }
        }
    }

    /// ID of the calling thread's active transaction
    pub fn current_transaction_id(&self) -> Option<u64> {
        self.scopes
            .get(&thread::current().id())
            .map(|scope| scope.txn_id)
    }

    /// Snapshot of the transaction counters
    pub fn metrics(&self) -> TransactionMetrics {
        TransactionMetrics {
            active: self.scopes.len() as u64,
            started: self.total_started.load(Ordering::Relaxed),
            committed: self.total_committed.load(Ordering::Relaxed),
            rolled_back: self.total_rolled_back.load(Ordering::Relaxed),
        }
    }

    fn complete(&self, thread: ThreadId, txn_id: u64, outcome: TransactionOutcome) -> CacheResult<()> {
        let (_, scope) = self
            .scopes
            .remove_if(&thread, |_, scope| scope.txn_id == txn_id)
            .ok_or(CacheError::NoActiveTransaction)?;
        let TransactionScope {
            resources,
            synchronizations,
            ..
        } = scope;
        drop(resources);

        match outcome {
            TransactionOutcome::Committed => self.total_committed.fetch_add(1, Ordering::Relaxed),
            TransactionOutcome::RolledBack => self.total_rolled_back.fetch_add(1, Ordering::Relaxed),
        };

        let mut failures = Vec::new();
        for synchronization in synchronizations {
            if let Err(e) = synchronization.after_completion(outcome) {
                error!(
                    target: "txcache::txn",
                    txn_id,
                    %outcome,
                    error = %e,
                    "Completion callback failed"
                );
                failures.push(e);
            }
        }

        debug!(target: "txcache::txn", txn_id, %outcome, failures = failures.len(), "Transaction finished");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(CacheError::Completion(failures))
        }
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("metrics", &self.metrics())
            .finish()
    }
}

impl TransactionContext for TransactionManager {
    fn is_transaction_active(&self) -> bool {
        self.scopes.contains_key(&thread::current().id())
    }

    fn get_resource(&self, id: ResourceId) -> Option<Resource> {
        self.scopes
            .get(&thread::current().id())
            .and_then(|scope| scope.resources.get(&id).cloned())
    }

    fn bind_resource(&self, id: ResourceId, resource: Resource) -> CacheResult<()> {
        let mut scope = self
            .scopes
            .get_mut(&thread::current().id())
            .ok_or(CacheError::NoActiveTransaction)?;
        match scope.resources.entry(id) {
            hash_map::Entry::Occupied(_) => Err(CacheError::ResourceAlreadyBound(id)),
            hash_map::Entry::Vacant(slot) => {
                slot.insert(resource);
                Ok(())
            }
        }
    }

    fn register_synchronization(
        &self,
        synchronization: Box<dyn TransactionSynchronization>,
    ) -> CacheResult<()> {
        self.scopes
            .get_mut(&thread::current().id())
            .ok_or(CacheError::NoActiveTransaction)?
            .synchronizations
            .push(synchronization);
        Ok(())
    }
}

/// Guard for a transaction begun with [`TransactionManager::begin`]
///
/// Bound to the thread that began it (neither `Send` nor `Sync`).
pub struct Transaction<'a> {
    manager: &'a TransactionManager,
    thread: ThreadId,
    txn_id: u64,
    finished: bool,
    _thread_bound: PhantomData<*const ()>,
}

impl Transaction<'_> {
    /// Unique ID of this transaction
    pub fn id(&self) -> u64 {
        self.txn_id
    }

    /// Commit: completion callbacks run with `Committed`
    ///
    /// # Errors
    /// Returns `CacheError::Completion` if any callback failed. The
    /// transaction counts as committed either way.
    pub fn commit(mut self) -> CacheResult<()> {
        self.finished = true;
        self.manager
            .complete(self.thread, self.txn_id, TransactionOutcome::Committed)
    }

    /// Roll back: completion callbacks run with `RolledBack`
    ///
    /// # Errors
    /// Returns `CacheError::Completion` if any callback failed.
    pub fn rollback(mut self) -> CacheResult<()> {
        self.finished = true;
        self.manager
            .complete(self.thread, self.txn_id, TransactionOutcome::RolledBack)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(target: "txcache::txn", txn_id = self.txn_id, "Transaction dropped without commit - rolling back");
        if let Err(e) = self
            .manager
            .complete(self.thread, self.txn_id, TransactionOutcome::RolledBack)
        {
            error!(target: "txcache::txn", txn_id = self.txn_id, error = %e, "Implicit rollback failed");
        }
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("txn_id", &self.txn_id)
            .field("finished", &self.finished)
            .finish()
    }
}
