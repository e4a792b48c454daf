//! Testing utilities for exercising the update protocol
//!
//! This module provides `VersionedStore` wrappers that inject the
//! interleavings and failures the retry loop has to survive:
//!
//! - **ConflictInjector**: commits a competing write right before the
//!   wrapped `conditional_put`, so the caller's write loses the race
//! - **FlakyStore**: fails reads and/or writes with `StoreUnavailable`
//!
//! Both count the calls that reach them, so tests can assert how many reads
//! and writes an update issued.
//!
//! # Example
//!
//! ```ignore
//! use optimist_storage::testing::ConflictInjector;
//!
//! let store = ConflictInjector::new(MemoryStore::new(), 2);
//! // The first two conditional puts observe VersionMismatch
//! ```

mod conflict;
mod flaky;

pub use conflict::ConflictInjector;
pub use flaky::FlakyStore;
