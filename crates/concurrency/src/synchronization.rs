//! Completion callback that flushes or discards a write buffer
//!
//! One `BufferSynchronization` is registered per write buffer, at the moment
//! the buffer is bound to a transaction. When the transaction finishes it:
//! - on commit: replays the buffer into the underlying cache
//! - on rollback: drops the buffer without touching the underlying cache
//!
//! Flush failures are fail-fast. The operations replayed before the failing
//! one stay applied to the underlying cache; the rest are dropped. The caller
//! that issued them has already moved on, so the failure is logged here and
//! handed back to the transaction context as `CacheError::FlushFailed`.

use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, error};
use txcache_core::{
    Cache, CacheError, CacheResult, TransactionOutcome, TransactionSynchronization,
};

use crate::write_buffer::WriteBuffer;

/// Write buffer shared between a decorator and its completion callback
pub type SharedBuffer<K, V> = Mutex<WriteBuffer<K, V>>;

/// Flushes one write buffer when its transaction commits
pub struct BufferSynchronization<K, V> {
    buffer: Arc<SharedBuffer<K, V>>,
    cache: Arc<dyn Cache<K, V>>,
}

impl<K, V> BufferSynchronization<K, V> {
    /// Bind `buffer` to the cache it will be flushed into
    pub fn new(buffer: Arc<SharedBuffer<K, V>>, cache: Arc<dyn Cache<K, V>>) -> Self {
        Self { buffer, cache }
    }
}

impl<K, V> TransactionSynchronization for BufferSynchronization<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn after_completion(self: Box<Self>, outcome: TransactionOutcome) -> CacheResult<()> {
        // Leave an empty buffer behind; nothing may observe the old one again
        let buffer = std::mem::take(&mut *self.buffer.lock());
        let cache_name = self.cache.name();

        if !outcome.is_committed() {
            debug!(
                target: "txcache::buffer",
                cache = %cache_name,
                discarded = buffer.len(),
                "Write buffer discarded on rollback"
            );
            return Ok(());
        }

        let pending = buffer.len();
        match buffer.flush(self.cache.as_ref()) {
            Ok(applied) => {
                debug!(
                    target: "txcache::buffer",
                    cache = %cache_name,
                    applied,
                    "Write buffer flushed"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    target: "txcache::buffer",
                    cache = %cache_name,
                    pending,
                    error = %e,
                    "Write buffer flush failed after commit - remaining operations dropped"
                );
                Err(CacheError::FlushFailed {
                    cache: cache_name.to_string(),
                    source: Box::new(e),
                })
            }
        }
    }
}
