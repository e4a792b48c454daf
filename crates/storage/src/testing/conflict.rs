//! Competing-writer injection

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use optimist_core::{Error, PutOutcome, Record, RecordId, Result, VersionCondition, VersionedStore};

type Competitor<P> = Box<dyn Fn(&P) -> P + Send + Sync>;

/// Store wrapper that loses races on purpose
///
/// For each of the first `conflicts` calls to `conditional_put`, the wrapper
/// first commits a competing write through the inner store's own version
/// gate (current version + 1, payload passed through the competitor
/// function, unchanged by default). The caller's write, still carrying the
/// old precondition, then observes `VersionMismatch`.
pub struct ConflictInjector<S: VersionedStore> {
    inner: S,
    remaining: AtomicUsize,
    injected: AtomicUsize,
    gets: AtomicUsize,
    puts: AtomicUsize,
    competitor: Option<Competitor<S::Payload>>,
}

impl<S: VersionedStore> ConflictInjector<S> {
    /// Inject a competing write before each of the first `conflicts` puts
    pub fn new(inner: S, conflicts: usize) -> Self {
        Self {
            inner,
            remaining: AtomicUsize::new(conflicts),
            injected: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            competitor: None,
        }
    }

    /// Inject a competing write before every put
    pub fn always(inner: S) -> Self {
        Self::new(inner, usize::MAX)
    }

    /// Set the payload change the competing writer applies
    pub fn with_competitor<F>(mut self, f: F) -> Self
    where
        F: Fn(&S::Payload) -> S::Payload + Send + Sync + 'static,
    {
        self.competitor = Some(Box::new(f));
        self
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Competing writes committed so far
    pub fn injected(&self) -> usize {
        self.injected.load(Ordering::SeqCst)
    }

    /// `get` calls received
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// `conditional_put` calls received
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn take_conflict(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn commit_competing_write(&self, id: &RecordId) -> Result<()> {
        let current = self.inner.get(id)?;
        let next = current
            .version
            .next()
            .ok_or_else(|| Error::VersionOverflow { id: id.clone() })?;
        let payload = match &self.competitor {
            Some(f) => f(&current.payload),
            None => current.payload.clone(),
        };
        let condition = VersionCondition::for_snapshot(&current);
        let outcome = self
            .inner
            .conditional_put(Record::with_version(id.clone(), next, payload), &condition)?;
        if outcome.is_committed() {
            self.injected.fetch_add(1, Ordering::SeqCst);
            debug!(target: "optimist::store", %id, version = %next, "Injected competing write");
        }
        Ok(())
    }
}

impl<S: VersionedStore> VersionedStore for ConflictInjector<S> {
    type Payload = S::Payload;

    fn get(&self, id: &RecordId) -> Result<Record<Self::Payload>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(id)
    }

    fn conditional_put(
        &self,
        record: Record<Self::Payload>,
        condition: &VersionCondition,
    ) -> Result<PutOutcome> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.take_conflict() {
            self.commit_competing_write(&condition.id)?;
        }
        self.inner.conditional_put(record, condition)
    }
}
