//! Updater: the optimistic-concurrency retry loop
//!
//! ## Protocol
//!
//! Each attempt:
//! 1. Reads the current record (the authoritative snapshot for the attempt)
//! 2. Applies the caller's transform to the snapshot
//! 3. Assigns `snapshot.version + 1`, discarding whatever version the
//!    transform left on the candidate
//! 4. Writes the candidate under `version == snapshot.version`
//! 5. On `VersionMismatch`, backs off and starts over from a fresh read
//!
//! Everything else a store reports is terminal and is returned as-is.
//!
//! ## Purity Requirement
//!
//! The transform MAY BE CALLED MULTIPLE TIMES, once per attempt, each time
//! against a newer snapshot. It MUST be a pure function of the record it is
//! given:
//! - No I/O (file, network, console)
//! - No external mutation
//! - No irreversible effects
//!
//! ## State
//!
//! The updater holds no mutable state between calls and caches no records.
//! Concurrent calls share nothing but the store.

use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use optimist_core::{
    BoxError, Error, PutOutcome, Record, RecordId, Result, VersionCondition, VersionedStore,
};

use crate::options::UpdateOptions;
use crate::retry::RetryConfig;

/// Result of a committed update, with the effort it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome<P> {
    /// The record as committed
    pub record: Record<P>,
    /// Attempts made, the committing one included
    pub attempts: usize,
    /// Attempts that lost a race (`attempts - 1` on success)
    pub conflicts: usize,
    /// Time spent in the update loop
    pub elapsed: Duration,
}

/// Executes read-transform-conditional-write cycles against a store
///
/// ## Example
///
/// ```
/// use optimist_concurrency::Updater;
/// use optimist_core::{Record, RecordId, Version};
/// use optimist_storage::MemoryStore;
///
/// let store = MemoryStore::new();
/// store.insert(Record::new("x", 0i64)).unwrap();
///
/// let updater = Updater::new(store);
/// let committed = updater.update_payload(&RecordId::from("x"), |n| n + 1).unwrap();
/// assert_eq!(committed.payload, 1);
/// assert_eq!(committed.version, Version::new(1));
/// ```
#[derive(Debug, Clone)]
pub struct Updater<S> {
    store: S,
    config: RetryConfig,
}

impl<S: VersionedStore> Updater<S> {
    /// Create an updater with the default retry policy
    pub fn new(store: S) -> Self {
        Self::with_config(store, RetryConfig::default())
    }

    /// Create an updater with an explicit retry policy
    pub fn with_config(store: S, config: RetryConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The retry policy
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Build the precondition for a candidate derived from `snapshot`
    ///
    /// The write may only commit while the stored version still equals the
    /// snapshot's version.
    pub fn condition_for(&self, snapshot: &Record<S::Payload>) -> VersionCondition {
        VersionCondition::for_snapshot(snapshot)
    }

    /// Update a record, retrying on conflict
    ///
    /// `transform` receives the snapshot and returns the candidate record.
    /// The candidate's version is overwritten; its id must be unchanged.
    ///
    /// # Errors
    ///
    /// - `Error::RecordNotFound` if `id` does not exist (no retry)
    /// - `Error::TransformFailed` if the transform returns an error (no retry)
    /// - `Error::RetriesExhausted` once the retry budget is spent
    /// - `Error::StoreUnavailable` and other store errors, as reported
    pub fn update<F, E>(&self, id: &RecordId, transform: F) -> Result<Record<S::Payload>>
    where
        F: Fn(&Record<S::Payload>) -> std::result::Result<Record<S::Payload>, E>,
        E: Into<BoxError>,
    {
        self.update_with(id, &UpdateOptions::default(), transform)
            .map(|outcome| outcome.record)
    }

    /// Update a record, honoring a deadline and cancellation
    ///
    /// Returns the committed record with attempt and conflict counts.
    pub fn update_with<F, E>(
        &self,
        id: &RecordId,
        options: &UpdateOptions,
        transform: F,
    ) -> Result<UpdateOutcome<S::Payload>>
    where
        F: Fn(&Record<S::Payload>) -> std::result::Result<Record<S::Payload>, E>,
        E: Into<BoxError>,
    {
        self.run(id, options, &self.config, |snapshot| {
            transform(snapshot)
                .map(|candidate| (candidate, ()))
                .map_err(Into::<BoxError>::into)
        })
        .map(|(outcome, ())| outcome)
    }

    /// Update only the payload with an infallible function
    pub fn update_payload<F>(&self, id: &RecordId, f: F) -> Result<Record<S::Payload>>
    where
        F: Fn(&S::Payload) -> S::Payload,
    {
        self.update(id, |snapshot| {
            Ok::<_, BoxError>(Record {
                id: snapshot.id.clone(),
                version: snapshot.version,
                payload: f(&snapshot.payload),
            })
        })
    }

    /// Apply a transition that also computes a result for the caller
    ///
    /// Returns the result computed by the attempt that committed, together
    /// with the committed record.
    ///
    /// ```
    /// use optimist_concurrency::Updater;
    /// use optimist_core::{BoxError, Record, RecordId};
    /// use optimist_storage::MemoryStore;
    ///
    /// let store = MemoryStore::new();
    /// store.insert(Record::new("seq", 41u64)).unwrap();
    /// let updater = Updater::new(store);
    ///
    /// let (ticket, record) = updater
    ///     .transition(&RecordId::from("seq"), |r| Ok::<_, BoxError>((r.payload + 1, r.payload + 1)))
    ///     .unwrap();
    /// assert_eq!(ticket, 42);
    /// assert_eq!(record.payload, 42);
    /// ```
    pub fn transition<F, T, E>(&self, id: &RecordId, f: F) -> Result<(T, Record<S::Payload>)>
    where
        F: Fn(&Record<S::Payload>) -> std::result::Result<(S::Payload, T), E>,
        E: Into<BoxError>,
    {
        self.run(id, &UpdateOptions::default(), &self.config, |snapshot| {
            let (payload, value) = f(snapshot).map_err(Into::<BoxError>::into)?;
            Ok((
                Record {
                    id: snapshot.id.clone(),
                    version: snapshot.version,
                    payload,
                },
                value,
            ))
        })
        .map(|(outcome, value)| (value, outcome.record))
    }

    /// Make exactly one attempt
    ///
    /// A conflict is reported as `Error::RetriesExhausted` with one attempt.
    pub fn try_update<F, E>(&self, id: &RecordId, transform: F) -> Result<Record<S::Payload>>
    where
        F: Fn(&Record<S::Payload>) -> std::result::Result<Record<S::Payload>, E>,
        E: Into<BoxError>,
    {
        let config = RetryConfig {
            max_retries: Some(0),
            ..self.config.clone()
        };
        self.run(id, &UpdateOptions::default(), &config, |snapshot| {
            transform(snapshot)
                .map(|candidate| (candidate, ()))
                .map_err(Into::<BoxError>::into)
        })
        .map(|(outcome, ())| outcome.record)
    }

    // ========================================================================
    // Retry loop
    // ========================================================================

    fn run<T, F>(
        &self,
        id: &RecordId,
        options: &UpdateOptions,
        config: &RetryConfig,
        derive: F,
    ) -> Result<(UpdateOutcome<S::Payload>, T)>
    where
        F: Fn(&Record<S::Payload>) -> std::result::Result<(Record<S::Payload>, T), BoxError>,
    {
        let started = Instant::now();
        let mut attempts = 0usize;
        let mut conflicts = 0usize;

        loop {
            options.check(id, attempts, started)?;
            attempts += 1;

            let snapshot = self.read_snapshot(id, options, config, attempts, started)?;
            let (candidate, value) = self.derive_candidate(&snapshot, attempts, &derive)?;
            let condition = self.condition_for(&snapshot);

            trace!(
                target: "optimist::update",
                %id,
                attempt = attempts,
                snapshot = %snapshot.version,
                "Attempting conditional write"
            );

            match self.store.conditional_put(candidate.clone(), &condition)? {
                PutOutcome::Committed => {
                    debug!(
                        target: "optimist::update",
                        %id,
                        version = %candidate.version,
                        attempts,
                        "Update committed"
                    );
                    let outcome = UpdateOutcome {
                        record: candidate,
                        attempts,
                        conflicts,
                        elapsed: started.elapsed(),
                    };
                    return Ok((outcome, value));
                }
                PutOutcome::VersionMismatch { actual } => {
                    conflicts += 1;
                    let conflict = Error::VersionConflict {
                        id: id.clone(),
                        expected: snapshot.version,
                        actual,
                    };

                    if !config.allows_retry(conflicts) {
                        warn!(target: "optimist::update", %id, attempts, "Update retries exhausted");
                        return Err(Error::RetriesExhausted {
                            id: id.clone(),
                            attempts,
                            last_conflict: Box::new(conflict),
                        });
                    }

                    let delay = config.calculate_delay(conflicts - 1);
                    debug!(
                        target: "optimist::update",
                        %id,
                        attempt = attempts,
                        expected = %snapshot.version,
                        %actual,
                        ?delay,
                        "Version conflict, retrying"
                    );
                    self.pause(delay, id, options, attempts, started)?;
                }
            }
        }
    }

    /// Read the snapshot for one attempt, retrying transport failures when
    /// the policy allows it
    fn read_snapshot(
        &self,
        id: &RecordId,
        options: &UpdateOptions,
        config: &RetryConfig,
        attempts: usize,
        started: Instant,
    ) -> Result<Record<S::Payload>> {
        let mut failures = 0usize;
        loop {
            match self.store.get(id) {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) if e.is_unavailable() && failures < config.max_unavailable_retries => {
                    failures += 1;
                    let delay = config.calculate_delay(failures - 1);
                    warn!(
                        target: "optimist::update",
                        %id,
                        error = %e,
                        failures,
                        "Store unavailable on read, retrying"
                    );
                    self.pause(delay, id, options, attempts, started)?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run the transform and stamp the candidate with the next version
    fn derive_candidate<T, F>(
        &self,
        snapshot: &Record<S::Payload>,
        attempt: usize,
        derive: &F,
    ) -> Result<(Record<S::Payload>, T)>
    where
        F: Fn(&Record<S::Payload>) -> std::result::Result<(Record<S::Payload>, T), BoxError>,
    {
        let next = snapshot
            .version
            .next()
            .ok_or_else(|| Error::VersionOverflow {
                id: snapshot.id.clone(),
            })?;

        let (mut candidate, value) = derive(snapshot).map_err(|source| Error::TransformFailed {
            id: snapshot.id.clone(),
            attempt,
            source,
        })?;

        if candidate.id != snapshot.id {
            return Err(Error::InvalidTransform {
                id: snapshot.id.clone(),
                reason: format!("transform changed record id to '{}'", candidate.id),
            });
        }

        candidate.version = next;
        Ok((candidate, value))
    }

    /// Sleep between attempts without overrunning the deadline
    fn pause(
        &self,
        delay: Duration,
        id: &RecordId,
        options: &UpdateOptions,
        attempts: usize,
        started: Instant,
    ) -> Result<()> {
        options.check(id, attempts, started)?;
        if delay.is_zero() {
            return Ok(());
        }
        let delay = match options.remaining() {
            Some(remaining) => delay.min(remaining),
            None => delay,
        };
        std::thread::sleep(delay);
        options.check(id, attempts, started)
    }
}
