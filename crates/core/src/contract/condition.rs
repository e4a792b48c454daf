//! Conditional-write precondition
//!
//! A `VersionCondition` is what the updater hands to the store alongside a
//! candidate record: "commit only if the stored version of `id` is still
//! `expected`". The comparison is strict equality on the `version` field.
//! Any other comparison (greater-or-equal, range) would let two writers
//! derived from different snapshots both commit.

use serde::{Deserialize, Serialize};

use crate::contract::Version;
use crate::types::{Record, RecordId};

/// Precondition of a conditional write
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionCondition {
    /// Record the condition applies to
    pub id: RecordId,
    /// Version the stored record must still have at commit time
    pub expected: Version,
}

impl VersionCondition {
    /// Name of the record field the condition compares
    pub const FIELD: &'static str = "version";

    /// Build a condition expecting `version` for `id`
    pub fn expect(id: RecordId, version: Version) -> Self {
        Self {
            id,
            expected: version,
        }
    }

    /// Build the condition for a candidate derived from `snapshot`
    pub fn for_snapshot<P>(snapshot: &Record<P>) -> Self {
        Self::expect(snapshot.id.clone(), snapshot.version)
    }

    /// Evaluate the condition against the currently stored version
    #[inline]
    pub fn holds(&self, stored: Version) -> bool {
        stored == self.expected
    }
}

impl std::fmt::Display for VersionCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} = {} on \"{}\"",
            Self::FIELD,
            self.expected.as_u64(),
            self.id
        )
    }
}

/// Outcome of a conditional write that reached the store
///
/// Transport and backend failures are not an outcome; stores report them as
/// `Err(Error::StoreUnavailable { .. })`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The condition held and the record was written
    Committed,
    /// The stored version had moved on; nothing was written
    VersionMismatch {
        /// Version found in the store at commit time
        actual: Version,
    },
}

impl PutOutcome {
    /// Check if the write was committed
    pub fn is_committed(&self) -> bool {
        matches!(self, PutOutcome::Committed)
    }
}
