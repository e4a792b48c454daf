//! Byte-level versioned store
//!
//! Keeps each payload MessagePack-encoded next to its version, the way a
//! remote document store holds it. Every `get` decodes, so malformed stored
//! bytes surface as `Error::Serialization` on the read path instead of
//! being handed to a transform.

use dashmap::DashMap;
use rustc_hash::FxHasher;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::hash::BuildHasherDefault;
use std::marker::PhantomData;
use tracing::trace;

use optimist_core::{
    Error, PutOutcome, Record, RecordId, Result, Version, VersionCondition, VersionedStore,
};

use crate::memory::check_candidate;
use crate::stats::StoreStats;

/// Encoded form of a record
#[derive(Debug, Clone)]
struct StoredRecord {
    version: Version,
    bytes: Vec<u8>,
}

fn encode<P: Serialize>(payload: &P) -> Result<Vec<u8>> {
    rmp_serde::to_vec(payload).map_err(|e| Error::Serialization(e.to_string()))
}

fn decode<P: DeserializeOwned>(id: &RecordId, bytes: &[u8]) -> Result<P> {
    rmp_serde::from_slice(bytes)
        .map_err(|e| Error::Serialization(format!("malformed payload for '{}': {}", id, e)))
}

/// Versioned store holding MessagePack-encoded payloads
pub struct EncodedStore<P> {
    records: DashMap<RecordId, StoredRecord, BuildHasherDefault<FxHasher>>,
    stats: StoreStats,
    _payload: PhantomData<fn() -> P>,
}

impl<P> EncodedStore<P>
where
    P: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: DashMap::with_hasher(Default::default()),
            stats: StoreStats::new(),
            _payload: PhantomData,
        }
    }

    /// Create a record, encoding its payload
    ///
    /// # Errors
    ///
    /// - `Error::AlreadyExists` if the id is taken
    /// - `Error::Serialization` if the payload cannot be encoded
    pub fn insert(&self, record: Record<P>) -> Result<()> {
        let bytes = encode(&record.payload)?;
        self.insert_raw(record.id, record.version, bytes)
    }

    /// Create a record from already-encoded bytes
    ///
    /// The bytes are not validated; a later `get` reports them if they do
    /// not decode.
    pub fn insert_raw(&self, id: RecordId, version: Version, bytes: Vec<u8>) -> Result<()> {
        use dashmap::mapref::entry::Entry;

        match self.records.entry(id) {
            Entry::Occupied(slot) => Err(Error::AlreadyExists {
                id: slot.key().clone(),
            }),
            Entry::Vacant(slot) => {
                trace!(target: "optimist::store", id = %slot.key(), %version, len = bytes.len(), "Encoded record created");
                slot.insert(StoredRecord { version, bytes });
                Ok(())
            }
        }
    }

    /// Encoded size of a record's payload
    pub fn encoded_len(&self, id: &RecordId) -> Option<usize> {
        self.records.get(id).map(|r| r.bytes.len())
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Operation counters
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }
}

impl<P> std::fmt::Debug for EncodedStore<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedStore")
            .field("records", &self.records)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<P> Default for EncodedStore<P>
where
    P: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> VersionedStore for EncodedStore<P>
where
    P: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    type Payload = P;

    fn get(&self, id: &RecordId) -> Result<Record<P>> {
        self.stats.record_get();
        // Copy out so decoding happens without holding the shard lock
        let stored = self
            .records
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| Error::RecordNotFound { id: id.clone() })?;
        let payload = decode(id, &stored.bytes)?;
        Ok(Record::with_version(id.clone(), stored.version, payload))
    }

    fn conditional_put(
        &self,
        record: Record<P>,
        condition: &VersionCondition,
    ) -> Result<PutOutcome> {
        self.stats.record_put();
        check_candidate(&record.id, record.version, condition)?;
        let bytes = encode(&record.payload)?;

        let mut stored = self
            .records
            .get_mut(&condition.id)
            .ok_or_else(|| Error::RecordNotFound {
                id: condition.id.clone(),
            })?;

        if !condition.holds(stored.version) {
            self.stats.record_mismatch();
            return Ok(PutOutcome::VersionMismatch {
                actual: stored.version,
            });
        }

        *stored = StoredRecord {
            version: record.version,
            bytes,
        };
        self.stats.record_commit();
        trace!(target: "optimist::store", %condition, "Encoded conditional put committed");
        Ok(PutOutcome::Committed)
    }
}
