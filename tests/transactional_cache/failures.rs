//! Backend failures during pass-through and commit flush

use crate::common::{init_tracing, key};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use txcache::{Cache, CacheError, CacheResult, TransactionManager, TxAwareCache, Value};

/// Backend that rejects writes to keys starting with `bad`
struct PickyCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl PickyCache {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn check(&self, key: &str) -> CacheResult<()> {
        if key.starts_with("bad") {
            Err(CacheError::backend("picky", format!("rejected key {key}")))
        } else {
            Ok(())
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }
}

impl Cache<String, Value> for PickyCache {
    fn name(&self) -> &str {
        "picky"
    }

    fn get(&self, key: &String) -> CacheResult<Option<Value>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: String, value: Value) -> CacheResult<()> {
        self.check(&key)?;
        self.entries.lock().insert(key, value);
        Ok(())
    }

    fn put_if_absent(&self, key: String, value: Value) -> CacheResult<Option<Value>> {
        self.check(&key)?;
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(&key) {
            return Ok(Some(existing.clone()));
        }
        entries.insert(key, value);
        Ok(None)
    }

    fn evict(&self, key: &String) -> CacheResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> CacheResult<()> {
        self.entries.lock().clear();
        Ok(())
    }
}

fn setup() -> (Arc<TransactionManager>, Arc<PickyCache>, TxAwareCache<String, Value>) {
    init_tracing();
    let manager = Arc::new(TransactionManager::new());
    let backend = Arc::new(PickyCache::new());
    let cache: TxAwareCache<String, Value> = TxAwareCache::new(backend.clone(), manager.clone());
    (manager, backend, cache)
}

#[test]
fn pass_through_error_is_returned_to_caller() {
    let (_, backend, cache) = setup();
    let err = cache.put(key("bad-key"), Value::Int(1)).unwrap_err();
    assert!(err.is_backend());
    assert!(!backend.contains("bad-key"));
}

#[test]
fn buffered_write_to_bad_key_fails_at_commit() {
    let (manager, backend, cache) = setup();

    let txn = manager.begin().unwrap();
    cache.put(key("a"), Value::Int(1)).unwrap();
    // Accepted into the buffer, the backend has not seen it yet
    cache.put(key("bad-key"), Value::Int(2)).unwrap();
    cache.put(key("z"), Value::Int(3)).unwrap();
    let err = txn.commit().unwrap_err();

    match err {
        CacheError::Completion(failures) => {
            assert_eq!(failures.len(), 1);
            match &failures[0] {
                CacheError::FlushFailed { cache, source } => {
                    assert_eq!(cache, "picky");
                    assert!(source.is_backend());
                }
                other => panic!("unexpected failure: {other:?}"),
            }
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Flush stops at the first failure
    assert!(backend.contains("a"));
    assert!(!backend.contains("bad-key"));
    assert!(!backend.contains("z"));
    assert_eq!(manager.metrics().committed, 1);
    assert!(manager.current_transaction_id().is_none());
}

#[test]
fn rollback_never_touches_backend() {
    let (manager, backend, cache) = setup();

    let txn = manager.begin().unwrap();
    cache.put(key("bad-key"), Value::Int(2)).unwrap();
    txn.rollback().unwrap();

    assert!(!backend.contains("bad-key"));
}
