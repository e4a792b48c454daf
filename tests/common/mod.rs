//! Shared test utilities for the integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use serde::{Deserialize, Serialize};

pub use optimist::testing::{ConflictInjector, FlakyStore};
pub use optimist::{
    BoxError, EncodedStore, Error, MemoryStore, Record, RecordId, RetryConfig, UpdateOptions,
    Updater, Version, VersionedStore,
};

// ============================================================================
// Payloads
// ============================================================================

/// The counter payload used throughout the suites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub counter: u64,
}

impl Counter {
    pub fn new(counter: u64) -> Self {
        Self { counter }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn id(s: &str) -> RecordId {
    RecordId::from(s)
}

/// `{id, version: 0, counter: 0}` in a fresh memory store
pub fn counter_store(name: &str) -> Arc<MemoryStore<Counter>> {
    let store = MemoryStore::new();
    store
        .insert(Record::new(name, Counter::new(0)))
        .expect("fresh store");
    Arc::new(store)
}

/// Same fixture in an encoded store
pub fn encoded_counter_store(name: &str) -> Arc<EncodedStore<Counter>> {
    let store = EncodedStore::new();
    store
        .insert(Record::new(name, Counter::new(0)))
        .expect("fresh store");
    Arc::new(store)
}

/// Retry policy for contention tests: unbounded, tiny delays
pub fn contention_retry() -> RetryConfig {
    RetryConfig::unbounded()
}

// ============================================================================
// Transforms
// ============================================================================

pub fn increment(record: &Record<Counter>) -> Result<Record<Counter>, BoxError> {
    Ok(Record {
        payload: Counter::new(record.payload.counter + 1),
        ..record.clone()
    })
}

/// Transform that counts its invocations
pub struct CountingTransform {
    calls: AtomicUsize,
}

impl CountingTransform {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn apply(&self, record: &Record<Counter>) -> Result<Record<Counter>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        increment(record)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Concurrency
// ============================================================================

/// Run `f(thread_index)` on `n` threads released together by a barrier
pub fn run_concurrent<F, T>(n: usize, f: F) -> Vec<T>
where
    F: Fn(usize) -> T + Send + Sync + 'static,
    T: Send + 'static,
{
    let barrier = Arc::new(Barrier::new(n));
    let f = Arc::new(f);

    let handles: Vec<_> = (0..n)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            let f = Arc::clone(&f);
            thread::spawn(move || {
                barrier.wait();
                f(i)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect()
}
