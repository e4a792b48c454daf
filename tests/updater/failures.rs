//! Terminal errors: surfaced once, nothing committed

use crate::common::*;
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_missing_record_fails_with_single_read() {
    let store = FlakyStore::new(MemoryStore::<Counter>::new());
    let updater = Updater::new(&store);
    let transform = CountingTransform::new();

    let err = updater
        .update(&id("missing"), |r| transform.apply(r))
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RecordNotFound { id: ref missing } if missing.as_str() == "missing"
    ));
    assert_eq!(store.gets(), 1);
    assert_eq!(store.puts(), 0);
    assert_eq!(transform.calls(), 0);
}

#[test]
fn test_transform_error_is_not_retried() {
    let store = ConflictInjector::new(MemoryStore::new(), 0);
    store.inner().insert(Record::new("x", Counter::new(0))).unwrap();
    let updater = Updater::new(&store);

    let err = updater
        .update(&id("x"), |_: &Record<Counter>| {
            Err::<Record<Counter>, BoxError>("quota exceeded".into())
        })
        .unwrap_err();

    match &err {
        Error::TransformFailed { attempt, .. } => assert_eq!(*attempt, 1),
        other => panic!("expected TransformFailed, got {other:?}"),
    }
    assert_eq!(err.source().unwrap().to_string(), "quota exceeded");
    assert_eq!(store.gets(), 1);
    assert_eq!(store.puts(), 0);
    assert_eq!(store.inner().get(&id("x")).unwrap().version, Version::ZERO);
}

#[test]
fn test_unavailable_write_keeps_source_and_commits_nothing() {
    let store = FlakyStore::new(MemoryStore::new()).fail_puts();
    store.inner().insert(Record::new("x", Counter::new(0))).unwrap();
    let updater = Updater::new(&store);

    let err = updater.update(&id("x"), increment).unwrap_err();

    assert!(err.is_unavailable());
    assert!(err.is_terminal());
    assert_eq!(store.puts(), 1);
    assert_eq!(store.inner().get(&id("x")).unwrap().payload, Counter::new(0));
}

#[test]
fn test_unavailable_read_retried_when_configured() {
    let store = FlakyStore::new(MemoryStore::new()).fail_gets(2);
    store.inner().insert(Record::new("x", Counter::new(0))).unwrap();
    let updater = Updater::with_config(
        &store,
        RetryConfig::unbounded().with_unavailable_retries(2),
    );

    let record = updater.update(&id("x"), increment).unwrap();

    assert_eq!(record.version, Version::new(1));
    assert_eq!(store.gets(), 3);
}

#[test]
fn test_unavailable_read_surfaces_without_retry_budget() {
    let store = FlakyStore::new(MemoryStore::new()).fail_gets(1);
    store.inner().insert(Record::new("x", Counter::new(0))).unwrap();
    let updater = Updater::new(&store);

    let err = updater.update(&id("x"), increment).unwrap_err();

    assert!(err.is_unavailable());
    assert!(err.source().is_some());
    assert_eq!(store.gets(), 1);
}

#[test]
fn test_retries_exhausted_reports_last_conflict() {
    let store = ConflictInjector::always(MemoryStore::new());
    store.inner().insert(Record::new("x", Counter::new(0))).unwrap();
    let updater = Updater::with_config(
        &store,
        RetryConfig::new()
            .with_max_retries(3)
            .with_base_delay_ms(0)
            .with_max_delay_ms(0),
    );

    let err = updater.update(&id("x"), increment).unwrap_err();

    match &err {
        Error::RetriesExhausted { attempts, last_conflict, .. } => {
            assert_eq!(*attempts, 4);
            assert!(last_conflict.is_conflict());
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
    // Only the injected competitor ever committed
    assert_eq!(store.inner().get(&id("x")).unwrap().version, Version::new(4));
    assert_eq!(store.inner().get(&id("x")).unwrap().payload, Counter::new(0));
}

#[test]
fn test_try_update_makes_one_attempt() {
    let store = ConflictInjector::new(MemoryStore::new(), 1);
    store.inner().insert(Record::new("x", Counter::new(0))).unwrap();
    let updater = Updater::new(&store);

    let err = updater.try_update(&id("x"), increment).unwrap_err();
    assert!(matches!(err, Error::RetriesExhausted { attempts: 1, .. }));

    let record = updater.try_update(&id("x"), increment).unwrap();
    assert_eq!(record.version, Version::new(2));
}

#[test]
fn test_deadline_stops_a_losing_caller() {
    let store = Arc::new(ConflictInjector::always(MemoryStore::new()));
    store.inner().insert(Record::new("x", Counter::new(0))).unwrap();
    let updater = Updater::with_config(
        Arc::clone(&store),
        RetryConfig::unbounded().with_base_delay_ms(1).with_max_delay_ms(5),
    );
    let options = UpdateOptions::new().with_timeout(Duration::from_millis(30));

    let err = updater.update_with(&id("x"), &options, increment).unwrap_err();

    assert!(matches!(err, Error::DeadlineExceeded { .. }));
    assert!(store.puts() >= 1);
}
