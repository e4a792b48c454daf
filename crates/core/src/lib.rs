//! Core types and traits for optimist
//!
//! This crate defines the foundational types shared by every layer:
//! - RecordId: Stable identifier of a versioned record
//! - Version: Per-record commit counter used as the conflict-detection token
//! - Record: The versioned entity (id, version, payload)
//! - VersionCondition: The precondition attached to every conditional write
//! - VersionedStore: The store contract the updater consumes
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod contract;
pub mod error;
pub mod traits;
pub mod types;

pub use contract::{PutOutcome, Version, VersionCondition};
pub use error::{BoxError, Error, Result};
pub use traits::VersionedStore;
pub use types::{Record, RecordId};
