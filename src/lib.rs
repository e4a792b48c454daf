//! Optimist - optimistic-concurrency updates for versioned records
//!
//! Every record carries a version. An update reads the record, applies a
//! caller-supplied transform, and writes the result only if the stored
//! version still matches the one that was read. On a mismatch the update
//! re-reads and re-applies the transform, so no concurrent update is lost.
//!
//! # Quick Start
//!
//! ```
//! use optimist::{BoxError, MemoryStore, Record, RecordId, Updater};
//!
//! let store = MemoryStore::new();
//! store.insert(Record::new("x", 0u64)).unwrap();
//!
//! let updater = Updater::new(store);
//! let record = updater
//!     .update(&RecordId::from("x"), |r| {
//!         Ok::<_, BoxError>(Record { payload: r.payload + 1, ..r.clone() })
//!     })
//!     .unwrap();
//!
//! assert_eq!(record.payload, 1);
//! assert_eq!(record.version.as_u64(), 1);
//! ```
//!
//! # Architecture
//!
//! - `optimist-core`: record, version and condition types, the
//!   [`VersionedStore`] contract and [`Error`]
//! - `optimist-storage`: [`MemoryStore`] and [`EncodedStore`] backends
//! - `optimist-concurrency`: the [`Updater`] retry loop and its configuration

pub use optimist_concurrency::{
    CancelFlag, RetryConfig, RetrySection, UpdateOptions, UpdateOutcome, Updater, UpdaterConfig,
    CONFIG_FILE_NAME,
};
pub use optimist_core::{
    BoxError, Error, PutOutcome, Record, RecordId, Result, Version, VersionCondition,
    VersionedStore,
};
pub use optimist_storage::{EncodedStore, MemoryStore, StatsSnapshot, StoreStats};

/// Fault-injecting store wrappers for tests
pub mod testing {
    pub use optimist_storage::testing::*;
}
