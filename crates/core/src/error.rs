//! Error types for optimist
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! ## Taxonomy
//!
//! | Variant | Raised by | Retried by the updater |
//! |---------|-----------|------------------------|
//! | `VersionConflict` | updater (from `PutOutcome::VersionMismatch`) | always, within budget |
//! | `RecordNotFound` | store | never |
//! | `StoreUnavailable` | store | reads only, when configured |
//! | `TransformFailed` | updater (caller's transform) | never |
//! | `RetriesExhausted` | updater | n/a (terminal) |
//! | `Cancelled` / `DeadlineExceeded` | updater | n/a (terminal) |

use std::time::Duration;
use thiserror::Error;

use crate::contract::Version;
use crate::types::RecordId;

/// Boxed error used to carry caller and backend failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for optimist operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for optimist
#[derive(Debug, Error)]
pub enum Error {
    /// No record exists for the id
    #[error("record not found: {id}")]
    RecordNotFound {
        /// Id that was looked up
        id: RecordId,
    },

    /// A record with this id already exists
    #[error("record already exists: {id}")]
    AlreadyExists {
        /// Id that was taken
        id: RecordId,
    },

    /// Transport or backend failure
    #[error("store unavailable: {reason}")]
    StoreUnavailable {
        /// What failed
        reason: String,
        /// Underlying backend error, if any
        #[source]
        source: Option<BoxError>,
    },

    /// The stored version moved on between read and conditional write
    #[error("version conflict on {id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// Record that conflicted
        id: RecordId,
        /// Version the candidate was derived from
        expected: Version,
        /// Version found in the store at commit time
        actual: Version,
    },

    /// The caller-supplied transform returned an error
    #[error("transform failed for {id} on attempt {attempt}: {source}")]
    TransformFailed {
        /// Record being updated
        id: RecordId,
        /// Attempt ordinal (1-based) on which the transform failed
        attempt: usize,
        /// Error returned by the transform
        #[source]
        source: BoxError,
    },

    /// The transform produced a record the updater refuses to write
    #[error("invalid transform for {id}: {reason}")]
    InvalidTransform {
        /// Record being updated
        id: RecordId,
        /// Why the candidate was rejected
        reason: String,
    },

    /// The conflict retry budget was spent without a successful commit
    #[error("retries exhausted for {id} after {attempts} attempts: {last_conflict}")]
    RetriesExhausted {
        /// Record being updated
        id: RecordId,
        /// Number of attempts made
        attempts: usize,
        /// The conflict that ended the final attempt
        #[source]
        last_conflict: Box<Error>,
    },

    /// The caller cancelled the update before it committed
    #[error("update of {id} cancelled after {attempts} attempts")]
    Cancelled {
        /// Record being updated
        id: RecordId,
        /// Number of attempts made before cancellation was observed
        attempts: usize,
    },

    /// The update deadline passed before a commit succeeded
    #[error("update of {id} exceeded its deadline after {attempts} attempts ({elapsed:?})")]
    DeadlineExceeded {
        /// Record being updated
        id: RecordId,
        /// Number of attempts made
        attempts: usize,
        /// Time spent in the update loop
        elapsed: Duration,
    },

    /// The record version cannot be incremented any further
    #[error("version overflow on {id}")]
    VersionOverflow {
        /// Record whose counter is exhausted
        id: RecordId,
    },

    /// Serialization/deserialization error (malformed stored data)
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid operation or store misuse
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Store failure without an underlying error value
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Error::StoreUnavailable {
            reason: reason.into(),
            source: None,
        }
    }

    /// Store failure wrapping the backend error
    pub fn unavailable_with(reason: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::StoreUnavailable {
            reason: reason.into(),
            source: Some(source.into()),
        }
    }

    /// Check if this is a version conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::VersionConflict { .. })
    }

    /// Check if this is a store availability failure
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::StoreUnavailable { .. })
    }

    /// Check if retrying the same operation could succeed
    pub fn is_retryable(&self) -> bool {
        self.is_conflict() || self.is_unavailable()
    }

    /// Check if the error ends an update with no further attempts
    pub fn is_terminal(&self) -> bool {
        !self.is_conflict()
    }

    /// Record id the error refers to, if any
    pub fn record_id(&self) -> Option<&RecordId> {
        match self {
            Error::RecordNotFound { id }
            | Error::AlreadyExists { id }
            | Error::VersionConflict { id, .. }
            | Error::TransformFailed { id, .. }
            | Error::InvalidTransform { id, .. }
            | Error::RetriesExhausted { id, .. }
            | Error::Cancelled { id, .. }
            | Error::DeadlineExceeded { id, .. }
            | Error::VersionOverflow { id } => Some(id),
            Error::StoreUnavailable { .. }
            | Error::Serialization(_)
            | Error::InvalidOperation(_)
            | Error::Config(_) => None,
        }
    }
}
