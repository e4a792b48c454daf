//! Retry configuration and backoff
//!
//! Contains RetryConfig for update retry behavior on version conflicts and,
//! optionally, on transient read failures.

use rand::Rng;
use std::time::Duration;

// ============================================================================
// Retry Configuration
// ============================================================================

/// Configuration for update retry behavior
///
/// A version conflict is always recoverable by re-reading and recomputing,
/// but an unbounded loop has no latency bound under contention. The default
/// therefore caps retries and spreads competing writers apart with jittered
/// exponential backoff.
///
/// # Example
/// ```
/// use optimist_concurrency::RetryConfig;
///
/// let config = RetryConfig::new()
///     .with_max_retries(5)
///     .with_base_delay_ms(2)
///     .with_max_delay_ms(100);
/// assert_eq!(config.max_retries, Some(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum conflict retries after the first attempt (`None` = unbounded)
    pub max_retries: Option<usize>,
    /// Base delay between retries in milliseconds (exponential backoff)
    pub base_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,
    /// Draw each delay uniformly from `[0, backoff]` instead of sleeping the
    /// full backoff
    pub jitter: bool,
    /// Retries of a read that failed with `StoreUnavailable` (per attempt)
    pub max_unavailable_retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: Some(10),
            base_delay_ms: 1,
            max_delay_ms: 50,
            jitter: true,
            max_unavailable_retries: 0,
        }
    }
}

impl RetryConfig {
    /// Create a new RetryConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a RetryConfig with no retries
    ///
    /// The first conflict ends the update with `RetriesExhausted`.
    pub fn no_retry() -> Self {
        Self {
            max_retries: Some(0),
            ..Default::default()
        }
    }

    /// Retry conflicts until a write commits, without backoff
    pub fn unbounded() -> Self {
        Self {
            max_retries: None,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter: false,
            max_unavailable_retries: 0,
        }
    }

    /// Set maximum number of retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Remove the retry cap, keeping the backoff settings
    pub fn without_retry_limit(mut self) -> Self {
        self.max_retries = None;
        self
    }

    /// Set base delay for exponential backoff
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set maximum delay between retries
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Enable or disable full jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Set how often a failed read is retried before the update fails
    pub fn with_unavailable_retries(mut self, retries: usize) -> Self {
        self.max_unavailable_retries = retries;
        self
    }

    /// Check if the conflict retry count is capped
    pub fn is_bounded(&self) -> bool {
        self.max_retries.is_some()
    }

    /// Total attempts an update may make (`None` = unbounded)
    pub fn max_attempts(&self) -> Option<usize> {
        self.max_retries.map(|r| r.saturating_add(1))
    }

    /// Check if another attempt may follow the `conflicts`-th conflict
    pub fn allows_retry(&self, conflicts: usize) -> bool {
        match self.max_retries {
            Some(max) => conflicts <= max,
            None => true,
        }
    }

    /// Backoff ceiling for a given retry (0-based), before jitter
    pub fn backoff_cap(&self, retry: usize) -> Duration {
        // Cap the shift to prevent overflow (1 << 63 is the max for u64)
        let shift = retry.min(63);
        let multiplier = 1u64 << shift;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }

    /// Calculate delay for a given retry (exponential backoff, optional jitter)
    pub fn calculate_delay(&self, retry: usize) -> Duration {
        let cap = self.backoff_cap(retry);
        if !self.jitter || cap.is_zero() {
            return cap;
        }
        let cap_ms = cap.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..=cap_ms))
    }
}
