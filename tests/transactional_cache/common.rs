//! Shared helpers

use std::sync::Arc;
use txcache::{InMemoryCache, TransactionManager, TxAwareCache, Value};

pub type Backend = InMemoryCache<String, Value>;

/// Route `tracing` output to the test harness once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub struct Env {
    pub manager: Arc<TransactionManager>,
    pub backend: Arc<Backend>,
    pub cache: Arc<TxAwareCache<String, Value>>,
}

pub fn env(name: &str) -> Env {
    init_tracing();
    let manager = Arc::new(TransactionManager::new());
    let backend: Arc<Backend> = Arc::new(InMemoryCache::new(name));
    let cache: Arc<TxAwareCache<String, Value>> =
        Arc::new(TxAwareCache::new(backend.clone(), manager.clone()));
    Env {
        manager,
        backend,
        cache,
    }
}

pub fn key(name: &str) -> String {
    name.to_string()
}
