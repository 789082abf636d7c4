//! Commit, rollback and pass-through behavior

use crate::common::{env, key};
use std::sync::Arc;
use std::thread;
use txcache::{Cache, CacheError, CacheExt, CacheResult, Value};

#[test]
fn put_is_private_until_commit() {
    let env = env("scenario-a");
    let txn = env.manager.begin().unwrap();

    env.cache.put(key("k1"), Value::Int(1)).unwrap();
    assert_eq!(env.cache.get(&key("k1")).unwrap(), Some(Value::Int(1)));

    let outside = Arc::clone(&env.cache);
    let seen = thread::spawn(move || outside.get(&key("k1")).unwrap())
        .join()
        .unwrap();
    assert_eq!(seen, None);
    assert_eq!(env.backend.get(&key("k1")).unwrap(), None);

    txn.commit().unwrap();
    assert_eq!(env.cache.get(&key("k1")).unwrap(), Some(Value::Int(1)));
    assert_eq!(env.backend.get(&key("k1")).unwrap(), Some(Value::Int(1)));
}

#[test]
fn evict_then_put_nets_to_put() {
    let env = env("scenario-b");
    env.backend.put(key("k1"), Value::Int(1)).unwrap();

    env.manager
        .transaction(|| {
            env.cache.evict(&key("k1"))?;
            assert_eq!(env.cache.get(&key("k1"))?, None);
            env.cache.put(key("k1"), Value::Int(2))?;
            assert_eq!(env.cache.get(&key("k1"))?, Some(Value::Int(2)));
            assert_eq!(env.backend.get(&key("k1"))?, Some(Value::Int(1)));
            Ok(())
        })
        .unwrap();

    assert_eq!(env.backend.get(&key("k1")).unwrap(), Some(Value::Int(2)));
}

#[test]
fn aborted_transaction_leaves_no_trace() {
    let env = env("scenario-c");

    let result = env.manager.transaction(|| -> CacheResult<()> {
        env.cache.put(key("k1"), Value::Int(1))?;
        Err(CacheError::InvalidConfig("abort".to_string()))
    });

    assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    assert_eq!(env.backend.get(&key("k1")).unwrap(), None);
    assert_eq!(env.manager.metrics().rolled_back, 1);
}

#[test]
fn panicking_transaction_rolls_back() {
    let env = env("scenario-c-panic");

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = env.manager.transaction(|| -> CacheResult<()> {
            env.cache.put(key("k1"), Value::Int(1))?;
            panic!("business logic failed");
        });
    }));

    assert!(outcome.is_err());
    assert_eq!(env.backend.get(&key("k1")).unwrap(), None);
    assert!(env.manager.current_transaction_id().is_none());
}

#[test]
fn no_transaction_is_pass_through() {
    let env = env("scenario-d");

    env.cache.put(key("k"), Value::String("v".into())).unwrap();
    assert_eq!(
        env.cache.get(&key("k")).unwrap(),
        Some(Value::String("v".into()))
    );
    assert_eq!(
        env.backend.get(&key("k")).unwrap(),
        Some(Value::String("v".into()))
    );

    env.cache.evict(&key("k")).unwrap();
    assert!(env.backend.is_empty());
    assert_eq!(env.manager.metrics().started, 0);
}

#[test]
fn clear_then_put_replays_in_order() {
    let env = env("clear");
    env.backend.put(key("old"), Value::Int(1)).unwrap();
    env.backend.put(key("kept"), Value::Int(2)).unwrap();

    let txn = env.manager.begin().unwrap();
    env.cache.put(key("dropped"), Value::Int(3)).unwrap();
    env.cache.clear().unwrap();
    assert_eq!(env.cache.get(&key("old")).unwrap(), None);
    env.cache.put(key("kept"), Value::Int(20)).unwrap();
    assert_eq!(env.backend.len(), 2);
    txn.commit().unwrap();

    let snapshot = env.backend.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get(&key("kept")), Some(&Value::Int(20)));
}

#[test]
fn put_if_absent_sees_buffer_and_backend() {
    let env = env("put-if-absent");
    env.backend.put(key("present"), Value::Int(1)).unwrap();

    env.manager
        .transaction(|| {
            assert_eq!(
                env.cache.put_if_absent(key("present"), Value::Int(9))?,
                Some(Value::Int(1))
            );
            assert_eq!(env.cache.put_if_absent(key("fresh"), Value::Int(2))?, None);
            assert_eq!(
                env.cache.put_if_absent(key("fresh"), Value::Int(3))?,
                Some(Value::Int(2))
            );
            Ok(())
        })
        .unwrap();

    assert_eq!(env.backend.get(&key("present")).unwrap(), Some(Value::Int(1)));
    assert_eq!(env.backend.get(&key("fresh")).unwrap(), Some(Value::Int(2)));
}

#[test]
fn typed_retrieval_inside_transaction() {
    let env = env("typed");

    env.manager
        .transaction(|| {
            env.cache.put(key("count"), Value::Int(42))?;
            env.cache.put(key("label"), Value::String("x".into()))?;

            assert_eq!(env.cache.get_as::<i64>(&key("count"))?, Some(42));
            assert_eq!(env.cache.get_as::<String>(&key("label"))?, Some("x".to_string()));
            assert_eq!(env.cache.get_as::<i64>(&key("missing"))?, None);
            assert!(matches!(
                env.cache.get_as::<bool>(&key("count")),
                Err(CacheError::TypeMismatch { .. })
            ));
            Ok(())
        })
        .unwrap();
}

#[test]
fn separate_caches_flush_independently() {
    let first = env("first");
    let second_backend: Arc<crate::common::Backend> =
        Arc::new(txcache::InMemoryCache::new("second"));
    let second: txcache::TxAwareCache<String, Value> =
        txcache::TxAwareCache::new(second_backend.clone(), first.manager.clone());

    first
        .manager
        .transaction(|| {
            first.cache.put(key("a"), Value::Int(1))?;
            second.put(key("b"), Value::Int(2))?;
            Ok(())
        })
        .unwrap();

    assert_eq!(first.backend.get(&key("a")).unwrap(), Some(Value::Int(1)));
    assert_eq!(first.backend.get(&key("b")).unwrap(), None);
    assert_eq!(second_backend.get(&key("b")).unwrap(), Some(Value::Int(2)));
}
