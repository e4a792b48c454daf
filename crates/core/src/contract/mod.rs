//! Contract types shared between the updater and store implementations
//!
//! ## Module Structure
//!
//! - `version`: Per-record version counter
//! - `condition`: The version-equality precondition of a conditional write,
//!   and the outcome a store reports for it

pub mod condition;
pub mod version;

pub use condition::{PutOutcome, VersionCondition};
pub use version::Version;
