//! Name-based cache lookup driven by `txcache.toml`

use crate::common::{init_tracing, key, Backend};
use std::sync::Arc;
use tempfile::TempDir;
use txcache::{
    Cache, CacheError, CacheResult, InMemoryCache, TransactionManager, TxAwareCacheManager,
    TxCacheConfig, Value, CONFIG_FILE_NAME,
};

fn open(config: TxCacheConfig) -> (Arc<TransactionManager>, TxAwareCacheManager<String, Value>) {
    init_tracing();
    let txn_manager = Arc::new(TransactionManager::new());
    let caches = TxAwareCacheManager::new(txn_manager.clone(), config).unwrap();
    for name in ["localTx", "noTx"] {
        let backend: Arc<Backend> = Arc::new(InMemoryCache::new(name));
        caches.register(backend).unwrap();
    }
    (txn_manager, caches)
}

fn put_both(caches: &TxAwareCacheManager<String, Value>, value: i64) -> CacheResult<()> {
    caches.get_cache("localTx")?.put(key("k"), Value::Int(value))?;
    caches.get_cache("noTx")?.put(key("k"), Value::Int(value))?;
    Ok(())
}

#[test]
fn config_file_selects_transactional_caches() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "transactional_caches = [\"localTx\"]\n").unwrap();

    let (txn_manager, caches) = open(TxCacheConfig::from_file(&path).unwrap());
    assert!(caches.is_transactional("localTx"));
    assert!(!caches.is_transactional("noTx"));

    txn_manager.transaction(|| put_both(&caches, 1)).unwrap();
    assert_eq!(
        caches.get_cache("localTx").unwrap().get(&key("k")).unwrap(),
        Some(Value::Int(1))
    );

    let result = txn_manager.transaction(|| -> CacheResult<()> {
        put_both(&caches, 2)?;
        Err(CacheError::InvalidConfig("abort".to_string()))
    });
    assert!(result.is_err());

    // Only the plain cache kept the aborted write
    assert_eq!(
        caches.get_cache("localTx").unwrap().get(&key("k")).unwrap(),
        Some(Value::Int(1))
    );
    assert_eq!(
        caches.get_cache("noTx").unwrap().get(&key("k")).unwrap(),
        Some(Value::Int(2))
    );
}

#[test]
fn default_config_file_is_written_and_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    TxCacheConfig::write_default_if_missing(&path).unwrap();
    let (_, caches) = open(TxCacheConfig::from_file(&path).unwrap());

    assert_eq!(caches.cache_names(), vec!["localTx", "noTx"]);
    assert!(!caches.is_transactional("localTx"));
}

#[test]
fn all_transactional_decorates_every_cache() {
    let (txn_manager, caches) = open(TxCacheConfig::all());

    let txn = txn_manager.begin().unwrap();
    put_both(&caches, 5).unwrap();
    txn.rollback().unwrap();

    for name in caches.cache_names() {
        assert_eq!(caches.get_cache(&name).unwrap().get(&key("k")).unwrap(), None);
    }
}

#[test]
fn unknown_cache_is_an_error() {
    let (_, caches) = open(TxCacheConfig::new());
    assert!(matches!(
        caches.get_cache("missing"),
        Err(CacheError::CacheNotFound(name)) if name == "missing"
    ));
}
