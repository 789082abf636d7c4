//! Transaction layer for txcache
//!
//! This crate makes cache mutations follow transaction outcomes:
//! - WriteBuffer: per-(cache, transaction) log of pending puts, evictions and clears
//! - TxAwareCache: decorator routing every cache call through the current buffer
//! - BufferSynchronization: completion callback flushing a buffer on commit
//! - TransactionManager: thread-associated `TransactionContext` with begin/commit/rollback
//!
//! Nothing reaches the wrapped cache before commit, and nothing at all on rollback.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decorator;
pub mod manager;
pub mod synchronization;
pub mod write_buffer;

pub use decorator::TxAwareCache;
pub use manager::{Transaction, TransactionManager, TransactionMetrics};
pub use synchronization::{BufferSynchronization, SharedBuffer};
pub use write_buffer::{BufferedOperation, PendingOperations, WriteBuffer};
