//! Correctness properties of the update protocol

use crate::common::*;
use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

// ============================================================================
// No lost updates
// ============================================================================

#[test]
fn test_no_lost_updates_under_contention() {
    const CALLERS: usize = 16;
    const PER_CALLER: usize = 25;

    let store = counter_store("x");
    let updater = Arc::new(Updater::with_config(Arc::clone(&store), contention_retry()));

    let committed: Vec<usize> = run_concurrent(CALLERS, {
        let updater = Arc::clone(&updater);
        move |_| {
            (0..PER_CALLER)
                .filter(|_| updater.update(&id("x"), increment).is_ok())
                .count()
        }
    });

    assert_eq!(committed.iter().sum::<usize>(), CALLERS * PER_CALLER);
    let record = store.get(&id("x")).unwrap();
    assert_eq!(record.payload.counter, (CALLERS * PER_CALLER) as u64);
}

// ============================================================================
// Version monotonicity
// ============================================================================

#[test]
fn test_committed_versions_form_a_gapless_sequence() {
    let store = counter_store("x");
    let updater = Arc::new(Updater::with_config(Arc::clone(&store), contention_retry()));
    let seen = Arc::new(Mutex::new(Vec::new()));

    run_concurrent(8, {
        let updater = Arc::clone(&updater);
        let seen = Arc::clone(&seen);
        move |_| {
            for _ in 0..20 {
                let record = updater.update(&id("x"), increment).unwrap();
                seen.lock().push(record.version.as_u64());
            }
        }
    });

    let mut versions = seen.lock().clone();
    versions.sort_unstable();
    assert_eq!(versions, (1..=160).collect::<Vec<u64>>());
}

#[test]
fn test_committed_record_counter_matches_its_version() {
    // Each increment commits exactly one version, so counter == version
    // for every record any caller gets back
    let store = counter_store("x");
    let updater = Arc::new(Updater::with_config(Arc::clone(&store), contention_retry()));

    let mismatched: Vec<usize> = run_concurrent(6, {
        let updater = Arc::clone(&updater);
        move |_| {
            (0..15)
                .map(|_| updater.update(&id("x"), increment).unwrap())
                .filter(|r| r.payload.counter != r.version.as_u64())
                .count()
        }
    });

    assert!(mismatched.iter().all(|&n| n == 0));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_sequential_updates_advance_by_one(n in 1usize..50) {
        let store = counter_store("x");
        let updater = Updater::new(Arc::clone(&store));
        let mut last = Version::ZERO;
        for _ in 0..n {
            let record = updater.update(&id("x"), increment).unwrap();
            prop_assert_eq!(record.version.as_u64(), last.as_u64() + 1);
            last = record.version;
        }
        prop_assert_eq!(store.get(&id("x")).unwrap().version, Version::new(n as u64));
    }
}

// ============================================================================
// Conflict retry
// ============================================================================

#[test]
fn test_conflict_rereads_and_commits_two_past_snapshot() {
    let store = ConflictInjector::new(MemoryStore::new(), 1)
        .with_competitor(|c: &Counter| Counter::new(c.counter + 100));
    store
        .inner()
        .insert(Record::with_version("x", Version::new(7), Counter::new(0)))
        .unwrap();
    let updater = Updater::new(&store);

    let seen = Mutex::new(Vec::new());
    let record = updater
        .update(&id("x"), |r: &Record<Counter>| {
            seen.lock().push(r.version);
            increment(r)
        })
        .unwrap();

    assert_eq!(record.version, Version::new(9));
    // The competitor's change is preserved, not overwritten
    assert_eq!(record.payload.counter, 101);
    assert_eq!(*seen.lock(), vec![Version::new(7), Version::new(8)]);
    assert_eq!(store.gets(), 2);
    assert_eq!(store.puts(), 2);
}

#[test]
fn test_transform_runs_once_per_attempt() {
    let store = ConflictInjector::new(MemoryStore::new(), 2);
    store.inner().insert(Record::new("x", Counter::new(0))).unwrap();
    let updater = Updater::new(&store);
    let transform = CountingTransform::new();

    let outcome = updater
        .update_with(&id("x"), &UpdateOptions::default(), |r| transform.apply(r))
        .unwrap();

    assert_eq!(transform.calls(), 3);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.conflicts, 2);
    assert_eq!(outcome.record.version, Version::new(3));
}

#[test]
fn test_transform_version_is_discarded() {
    let store = counter_store("x");
    let updater = Updater::new(Arc::clone(&store));

    let record = updater
        .update(&id("x"), |r: &Record<Counter>| {
            Ok::<_, BoxError>(Record {
                version: Version::new(999),
                payload: Counter::new(r.payload.counter + 1),
                ..r.clone()
            })
        })
        .unwrap();

    assert_eq!(record.version, Version::new(1));
    assert_eq!(store.get(&id("x")).unwrap().version, Version::new(1));
}

// ============================================================================
// End-to-end scenario
// ============================================================================

#[test]
fn test_ten_callers_increment_shared_counter() {
    let store = counter_store("x");
    let updater = Arc::new(Updater::with_config(Arc::clone(&store), contention_retry()));

    let returned: Vec<Record<Counter>> = run_concurrent(10, {
        let updater = Arc::clone(&updater);
        move |_| updater.update(&id("x"), increment).unwrap()
    });

    let final_record = store.get(&id("x")).unwrap();
    assert_eq!(final_record.id, id("x"));
    assert_eq!(final_record.version, Version::new(10));
    assert_eq!(final_record.payload, Counter::new(10));

    let versions: HashSet<u64> = returned.iter().map(|r| r.version.as_u64()).collect();
    assert_eq!(versions.len(), 10);
    assert!(versions.iter().all(|v| (1..=10).contains(v)));
}
