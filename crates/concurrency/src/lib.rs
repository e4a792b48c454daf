//! Concurrency layer for optimist
//!
//! This crate implements the optimistic-concurrency update protocol:
//! - Updater: read, transform, version-gated write, retry on conflict
//! - RetryConfig: bounded (or unbounded) retries with exponential backoff
//!   and full jitter
//! - UpdateOptions: per-call deadline and cancellation
//! - UpdaterConfig: `optimist.toml` configuration
//!
//! No update is lost to a concurrent writer: every committed record was
//! derived from the version that was current at commit time. No ordering is
//! promised between concurrent updates of the same record.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod options;
pub mod retry;
pub mod updater;

pub use config::{RetrySection, UpdaterConfig, CONFIG_FILE_NAME};
pub use options::{CancelFlag, UpdateOptions};
pub use retry::RetryConfig;
pub use updater::{UpdateOutcome, Updater};
