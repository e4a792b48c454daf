//! `optimist.toml` driving an updater

use crate::common::*;
use optimist::{UpdaterConfig, CONFIG_FILE_NAME};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_config_file_round_trips_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        "timeout_ms = 500\n\n[retry]\nmax_retries = 2\nbase_delay_ms = 0\nmax_delay_ms = 0\n",
    )
    .unwrap();

    let config = UpdaterConfig::load(&path).unwrap();
    let retry = config.retry_config();
    assert_eq!(retry.max_retries, Some(2));
    assert_eq!(retry.max_delay_ms, 0);
    assert_eq!(config.timeout_ms, Some(500));
}

#[test]
fn test_configured_budget_bounds_the_update() {
    let config = UpdaterConfig::from_toml_str(
        "[retry]\nmax_retries = 2\nbase_delay_ms = 0\nmax_delay_ms = 0\n",
    )
    .unwrap();
    let store = Arc::new(ConflictInjector::always(MemoryStore::new()));
    store.inner().insert(Record::new("x", Counter::new(0))).unwrap();
    let updater = config.build(Arc::clone(&store));

    let err = updater
        .update_with(&id("x"), &config.update_options(), increment)
        .unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
    assert_eq!(store.puts(), 3);
}

#[test]
fn test_unbounded_config_resolves_contention() {
    let config = UpdaterConfig::from_toml_str(
        "[retry]\nunbounded = true\nbase_delay_ms = 0\nmax_delay_ms = 1\n",
    )
    .unwrap();
    let store = counter_store("x");
    let updater = Arc::new(config.build(Arc::clone(&store)));

    run_concurrent(8, {
        let updater = Arc::clone(&updater);
        move |_| {
            for _ in 0..10 {
                updater.update(&id("x"), increment).unwrap();
            }
        }
    });

    assert_eq!(store.get(&id("x")).unwrap().payload, Counter::new(80));
}

#[test]
fn test_unknown_key_is_a_config_error() {
    let err = UpdaterConfig::from_toml_str("[retry]\nretries = 3\n").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
