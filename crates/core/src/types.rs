//! Record identity and the versioned record itself

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::contract::Version;

/// Stable identifier of a record
///
/// Unique per record and immutable after creation. Acts as the lookup
/// (partition) key in every store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create an identifier from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        RecordId(id.into())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A versioned record
///
/// `payload` holds the domain fields mutated by caller transforms.
/// `version` is owned by the update protocol: callers never assign it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record<P> {
    /// Stable identifier
    pub id: RecordId,
    /// Commit counter, `Version::ZERO` at creation
    pub version: Version,
    /// Domain fields
    pub payload: P,
}

impl<P> Record<P> {
    /// Create a record at the baseline version
    pub fn new(id: impl Into<RecordId>, payload: P) -> Self {
        Self::with_version(id, Version::ZERO, payload)
    }

    /// Create a record at an explicit version
    pub fn with_version(id: impl Into<RecordId>, version: Version, payload: P) -> Self {
        Self {
            id: id.into(),
            version,
            payload,
        }
    }

    /// Replace the payload, keeping id and version
    pub fn with_payload<Q>(self, payload: Q) -> Record<Q> {
        Record {
            id: self.id,
            version: self.version,
            payload,
        }
    }

    /// Transform the payload, keeping id and version
    pub fn map_payload<Q, F>(self, f: F) -> Record<Q>
    where
        F: FnOnce(P) -> Q,
    {
        Record {
            id: self.id,
            version: self.version,
            payload: f(self.payload),
        }
    }
}
