//! Record version counter
//!
//! Every record carries a `Version`. It starts at `Version::ZERO` when the
//! record is created and is incremented by exactly one on each successful
//! conditional write. A version is never decremented and never reused for
//! two different logical states of the same record.
//!
//! The version doubles as the conflict-detection token: a writer that derived
//! its candidate from version `v` may only commit while the stored version is
//! still `v`.

use serde::{Deserialize, Serialize};

/// Per-record commit counter
///
/// ## Invariants
///
/// - Monotonically increasing within a record
/// - Each commit advances the version by exactly one
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Baseline version of a freshly created record
    pub const ZERO: Version = Version(0);

    /// Create a version from its raw counter value
    pub const fn new(n: u64) -> Self {
        Version(n)
    }

    /// Get the numeric value
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The version a successful commit on top of this one produces
    ///
    /// Returns `None` once the counter is exhausted (`u64::MAX`).
    #[inline]
    pub const fn next(&self) -> Option<Version> {
        match self.0.checked_add(1) {
            Some(n) => Some(Version(n)),
            None => None,
        }
    }

    /// Check if this is the baseline version
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u64> for Version {
    fn from(v: u64) -> Self {
        Version(v)
    }
}

impl From<Version> for u64 {
    fn from(v: Version) -> Self {
        v.0
    }
}

// ============================================================================
// Tests
// ============================================================================
