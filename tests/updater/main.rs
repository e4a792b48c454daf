//! Updater Integration Test Suite
//!
//! Drives the public `optimist` facade end to end:
//!
//! - `properties`: lost updates, version sequence, conflict retry, transform
//!   re-invocation and the ten-caller counter scenario
//! - `failures`: terminal errors and what they leave behind
//! - `stores`: the same guarantees over the encoded backend
//! - `config`: `optimist.toml` driving an updater
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test updater
//! cargo test --test updater properties::
//! cargo test --test updater -- --nocapture
//! ```

#[path = "../common/mod.rs"]
mod common;

mod config;
mod failures;
mod properties;
mod stores;
