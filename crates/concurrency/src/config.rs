//! Updater configuration via `optimist.toml`
//!
//! The retry policy and an optional per-update timeout can be kept in a
//! TOML file so deployments tune contention behavior without a rebuild.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use optimist_core::{Error, Result, VersionedStore};

use crate::options::UpdateOptions;
use crate::retry::RetryConfig;
use crate::updater::Updater;

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "optimist.toml";

/// `[retry]` table of `optimist.toml`
///
/// Missing keys fall back to `RetryConfig::default()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySection {
    /// Maximum conflict retries; ignored when `unbounded` is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<usize>,
    /// Retry conflicts until a write commits
    pub unbounded: bool,
    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Backoff ceiling in milliseconds
    pub max_delay_ms: u64,
    /// Randomize each delay within `[0, backoff]`
    pub jitter: bool,
    /// Retries of a read that failed with `StoreUnavailable`
    pub unavailable_retries: usize,
}

impl Default for RetrySection {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_retries: None,
            unbounded: false,
            base_delay_ms: defaults.base_delay_ms,
            max_delay_ms: defaults.max_delay_ms,
            jitter: defaults.jitter,
            unavailable_retries: defaults.max_unavailable_retries,
        }
    }
}

/// Updater configuration loaded from `optimist.toml`
///
/// # Example
///
/// ```toml
/// # Per-update timeout in milliseconds (omit for none)
/// timeout_ms = 2000
///
/// [retry]
/// max_retries = 10
/// base_delay_ms = 1
/// max_delay_ms = 50
/// jitter = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdaterConfig {
    /// Per-update timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Retry policy
    pub retry: RetrySection,
}

impl UpdaterConfig {
    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` on malformed TOML, unknown keys, or a base
    /// delay larger than the maximum delay.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: UpdaterConfig =
            toml::from_str(s).map_err(|e| Error::Config(format!("invalid optimist.toml: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check cross-field constraints
    ///
    /// `from_toml_str` runs this on every parsed file; call it again after
    /// changing fields in code.
    pub fn validate(&self) -> Result<()> {
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(Error::Config(format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }
        Ok(())
    }

    /// The retry policy this configuration describes
    pub fn retry_config(&self) -> RetryConfig {
        let section = &self.retry;
        let max_retries = if section.unbounded {
            None
        } else {
            Some(
                section
                    .max_retries
                    .or(RetryConfig::default().max_retries)
                    .unwrap_or_default(),
            )
        };
        RetryConfig {
            max_retries,
            base_delay_ms: section.base_delay_ms,
            max_delay_ms: section.max_delay_ms,
            jitter: section.jitter,
            max_unavailable_retries: section.unavailable_retries,
        }
    }

    /// Configured per-update timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Options for one update call; the deadline starts now
    pub fn update_options(&self) -> UpdateOptions {
        match self.timeout() {
            Some(timeout) => UpdateOptions::new().with_timeout(timeout),
            None => UpdateOptions::new(),
        }
    }

    /// Build an updater over `store` with this retry policy
    pub fn build<S: VersionedStore>(&self, store: S) -> Updater<S> {
        Updater::with_config(store, self.retry_config())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# optimist updater configuration
#
# Per-update timeout in milliseconds. No new attempt starts after it passes.
# timeout_ms = 2000

[retry]
# Conflict retries after the first attempt. Set `unbounded = true` to retry
# until a write commits.
max_retries = 10
unbounded = false

# Exponential backoff between conflicting attempts: base * 2^retry, capped.
base_delay_ms = 1
max_delay_ms = 50

# Sleep a random duration in [0, backoff] instead of the full backoff.
jitter = true

# Retries of a read that failed because the store was unavailable.
# Failed writes are never retried: their outcome is unknown.
unavailable_retries = 0
"#
    }
}
