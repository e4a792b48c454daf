//! Availability failure injection

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use optimist_core::{Error, PutOutcome, Record, RecordId, Result, VersionCondition, VersionedStore};

/// Store wrapper that reports `StoreUnavailable`
///
/// The first `failing_gets` reads fail; writes fail while `fail_puts` is set.
pub struct FlakyStore<S> {
    inner: S,
    failing_gets: AtomicUsize,
    fail_puts: AtomicBool,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl<S: VersionedStore> FlakyStore<S> {
    /// Wrap a store; no failures until configured
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing_gets: AtomicUsize::new(0),
            fail_puts: AtomicBool::new(false),
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
        }
    }

    /// Fail the next `n` reads
    pub fn fail_gets(self, n: usize) -> Self {
        self.failing_gets.store(n, Ordering::SeqCst);
        self
    }

    /// Fail every write until `set_fail_puts(false)`
    pub fn fail_puts(self) -> Self {
        self.fail_puts.store(true, Ordering::SeqCst);
        self
    }

    /// Toggle write failures
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// `get` calls received, failed ones included
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// `conditional_put` calls received, failed ones included
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl<S: VersionedStore> VersionedStore for FlakyStore<S> {
    type Payload = S::Payload;

    fn get(&self, id: &RecordId) -> Result<Record<Self::Payload>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_gets
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::unavailable_with(
                format!("get '{}' failed", id),
                std::io::Error::new(std::io::ErrorKind::TimedOut, "injected read timeout"),
            ));
        }
        self.inner.get(id)
    }

    fn conditional_put(
        &self,
        record: Record<Self::Payload>,
        condition: &VersionCondition,
    ) -> Result<PutOutcome> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Error::unavailable(format!(
                "conditional put ({}) failed",
                condition
            )));
        }
        self.inner.conditional_put(record, condition)
    }
}
