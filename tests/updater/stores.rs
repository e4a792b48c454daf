//! The update guarantees over the encoded backend

use crate::common::*;
use std::sync::Arc;

#[test]
fn test_encoded_store_no_lost_updates() {
    let store = encoded_counter_store("x");
    let updater = Arc::new(Updater::with_config(Arc::clone(&store), contention_retry()));

    run_concurrent(10, {
        let updater = Arc::clone(&updater);
        move |_| {
            for _ in 0..10 {
                updater.update(&id("x"), increment).unwrap();
            }
        }
    });

    let record = store.get(&id("x")).unwrap();
    assert_eq!(record.payload, Counter::new(100));
    assert_eq!(record.version, Version::new(100));
    let stats = store.stats().snapshot();
    assert_eq!(stats.commits, 100);
    assert_eq!(stats.puts, stats.commits + stats.mismatches);
}

#[test]
fn test_malformed_payload_is_terminal() {
    let store = EncodedStore::<Counter>::new();
    store
        .insert_raw(id("x"), Version::new(3), vec![0xc1, 0xff, 0x00])
        .unwrap();
    let updater = Updater::new(&store);
    let transform = CountingTransform::new();

    let err = updater
        .update(&id("x"), |r| transform.apply(r))
        .unwrap_err();

    assert!(matches!(err, Error::Serialization(_)));
    assert!(err.is_terminal());
    assert_eq!(transform.calls(), 0);
}

#[test]
fn test_memory_store_stats_account_for_every_put() {
    let store = counter_store("x");
    let updater = Arc::new(Updater::with_config(Arc::clone(&store), contention_retry()));

    run_concurrent(8, {
        let updater = Arc::clone(&updater);
        move |_| {
            for _ in 0..5 {
                updater.update(&id("x"), increment).unwrap();
            }
        }
    });

    let stats = store.stats().snapshot();
    assert_eq!(stats.commits, 40);
    assert_eq!(stats.puts, stats.commits + stats.mismatches);
    assert_eq!(stats.gets, stats.puts);
}
