//! Per-call update options: deadline and cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use optimist_core::{Error, RecordId, Result};

/// Shared cancellation signal
///
/// Clones observe the same flag. Cancelling is one-way.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options checked before every attempt and around every backoff sleep
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Point in time after which no new attempt starts
    pub deadline: Option<Instant>,
    /// Cancellation signal
    pub cancel: Option<CancelFlag>,
}

impl UpdateOptions {
    /// No deadline, no cancellation
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deadline to `timeout` from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Set an absolute deadline
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a cancellation flag
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Time left before the deadline (`None` without a deadline)
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail if the update was cancelled or ran out of time
    pub(crate) fn check(&self, id: &RecordId, attempts: usize, started: Instant) -> Result<()> {
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            return Err(Error::Cancelled {
                id: id.clone(),
                attempts,
            });
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::DeadlineExceeded {
                    id: id.clone(),
                    attempts,
                    elapsed: started.elapsed(),
                });
            }
        }
        Ok(())
    }
}
