//! In-memory versioned store
//!
//! # Design
//!
//! - DashMap: sharded map, readers never block each other
//! - FxHasher: fast non-crypto hash for record ids
//! - `conditional_put` holds the shard write lock for the target entry while
//!   it compares versions and swaps the record, so the check and the commit
//!   are one atomic step for every other thread
//!
//! Records are only created through `insert`. After that the version gate is
//! the only way to change them.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use tracing::trace;

use optimist_core::{
    Error, PutOutcome, Record, RecordId, Result, Version, VersionCondition, VersionedStore,
};

use crate::stats::StoreStats;

type FxBuildHasher = BuildHasherDefault<FxHasher>;

/// Reject candidates that could not have come from the update protocol
///
/// The record must target the id named by the condition and must carry the
/// version directly after the expected one.
pub(crate) fn check_candidate(
    id: &RecordId,
    version: Version,
    condition: &VersionCondition,
) -> Result<()> {
    if *id != condition.id {
        return Err(Error::InvalidOperation(format!(
            "record id '{}' does not match condition id '{}'",
            id, condition.id
        )));
    }
    if condition.expected.next() != Some(version) {
        return Err(Error::InvalidOperation(format!(
            "candidate version {} does not follow expected version {} for '{}'",
            version, condition.expected, id
        )));
    }
    Ok(())
}

/// DashMap-backed store of typed records
///
/// # Example
///
/// ```
/// use optimist_core::{Record, RecordId, VersionCondition, VersionedStore};
/// use optimist_storage::MemoryStore;
///
/// let store = MemoryStore::new();
/// store.insert(Record::new("x", 0i64)).unwrap();
///
/// let snapshot = store.get(&RecordId::from("x")).unwrap();
/// let condition = VersionCondition::for_snapshot(&snapshot);
/// let next = Record::with_version("x", snapshot.version.next().unwrap(), 1i64);
/// assert!(store.conditional_put(next, &condition).unwrap().is_committed());
/// ```
#[derive(Debug)]
pub struct MemoryStore<P> {
    records: DashMap<RecordId, Record<P>, FxBuildHasher>,
    stats: StoreStats,
}

impl<P> MemoryStore<P>
where
    P: Clone + Send + Sync,
{
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: DashMap::with_hasher(FxBuildHasher::default()),
            stats: StoreStats::new(),
        }
    }

    /// Create a record
    ///
    /// The record is stored as given, including its version.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyExists` if a record with the same id exists.
    pub fn insert(&self, record: Record<P>) -> Result<()> {
        match self.records.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(Error::AlreadyExists { id: record.id }),
            Entry::Vacant(slot) => {
                trace!(target: "optimist::store", id = %record.id, version = %record.version, "Record created");
                slot.insert(record);
                Ok(())
            }
        }
    }

    /// Check if a record exists
    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids of all records, sorted
    pub fn ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self.records.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Operation counters
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }
}

impl<P> Default for MemoryStore<P>
where
    P: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> VersionedStore for MemoryStore<P>
where
    P: Clone + Send + Sync,
{
    type Payload = P;

    fn get(&self, id: &RecordId) -> Result<Record<P>> {
        self.stats.record_get();
        self.records
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| Error::RecordNotFound { id: id.clone() })
    }

    fn conditional_put(
        &self,
        record: Record<P>,
        condition: &VersionCondition,
    ) -> Result<PutOutcome> {
        self.stats.record_put();
        check_candidate(&record.id, record.version, condition)?;

        // The RefMut keeps the shard locked until it is dropped
        let mut stored = self
            .records
            .get_mut(&condition.id)
            .ok_or_else(|| Error::RecordNotFound {
                id: condition.id.clone(),
            })?;

        if !condition.holds(stored.version) {
            self.stats.record_mismatch();
            trace!(target: "optimist::store", %condition, actual = %stored.version, "Conditional put rejected");
            return Ok(PutOutcome::VersionMismatch {
                actual: stored.version,
            });
        }

        *stored = record;
        self.stats.record_commit();
        trace!(target: "optimist::store", %condition, "Conditional put committed");
        Ok(PutOutcome::Committed)
    }
}
