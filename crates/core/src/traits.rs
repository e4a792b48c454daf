//! Store contract consumed by the updater
//!
//! This module defines the `VersionedStore` trait. The updater only ever
//! talks to a store through it, so in-memory, encoded, or remote backends
//! can be swapped without touching the retry protocol.

use std::sync::Arc;

use crate::contract::{PutOutcome, VersionCondition};
use crate::error::Result;
use crate::types::{Record, RecordId};

/// Key-value store of versioned records with atomic conditional writes
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
///
/// # Atomicity
///
/// `conditional_put` must evaluate the condition and commit the record as a
/// single atomic step. Two concurrent calls for the same id must never both
/// return `PutOutcome::Committed` for the same expected version.
pub trait VersionedStore: Send + Sync {
    /// Domain fields stored with every record
    type Payload: Clone + Send + Sync;

    /// Read the current record for `id`
    ///
    /// Returns a point-in-time snapshot.
    ///
    /// # Errors
    ///
    /// - `Error::RecordNotFound` if no record exists for `id`
    /// - `Error::StoreUnavailable` on transport or backend failure
    /// - `Error::Serialization` if the stored data cannot be decoded
    fn get(&self, id: &RecordId) -> Result<Record<Self::Payload>>;

    /// Write `record` only if `condition` holds at commit time
    ///
    /// Returns `PutOutcome::VersionMismatch` (carrying the stored version)
    /// when the stored version differs from `condition.expected`.
    ///
    /// # Errors
    ///
    /// - `Error::RecordNotFound` if the record no longer exists
    /// - `Error::StoreUnavailable` on transport or backend failure
    fn conditional_put(
        &self,
        record: Record<Self::Payload>,
        condition: &VersionCondition,
    ) -> Result<PutOutcome>;
}

impl<S: VersionedStore + ?Sized> VersionedStore for Arc<S> {
    type Payload = S::Payload;

    fn get(&self, id: &RecordId) -> Result<Record<Self::Payload>> {
        (**self).get(id)
    }

    fn conditional_put(
        &self,
        record: Record<Self::Payload>,
        condition: &VersionCondition,
    ) -> Result<PutOutcome> {
        (**self).conditional_put(record, condition)
    }
}

impl<S: VersionedStore + ?Sized> VersionedStore for &S {
    type Payload = S::Payload;

    fn get(&self, id: &RecordId) -> Result<Record<Self::Payload>> {
        (**self).get(id)
    }

    fn conditional_put(
        &self,
        record: Record<Self::Payload>,
        condition: &VersionCondition,
    ) -> Result<PutOutcome> {
        (**self).conditional_put(record, condition)
    }
}
