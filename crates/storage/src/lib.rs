//! Storage layer for optimist
//!
//! This crate implements `VersionedStore` backends:
//! - MemoryStore: DashMap-backed store of typed records, conditional writes
//!   evaluated under the shard entry lock
//! - EncodedStore: byte-level store that keeps payloads MessagePack-encoded,
//!   the way a remote key-value store holds them
//! - StoreStats: operation counters shared by both backends
//! - testing: fault-injecting wrappers for exercising the retry protocol
//!
//! Neither backend can be written around the version gate: the only
//! mutation after `insert` is `conditional_put`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoded;
pub mod memory;
pub mod stats;
pub mod testing;

pub use encoded::EncodedStore;
pub use memory::MemoryStore;
pub use stats::{StatsSnapshot, StoreStats};
