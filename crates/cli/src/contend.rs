//! Contention driver: N callers incrementing one shared counter.
//!
//! Seeds `{id: "x", version: 0, counter: 0}` in a `MemoryStore`, runs every
//! caller on its own scoped thread, and tallies what each update cost.

use clap::ArgMatches;
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::info;

use optimist_concurrency::UpdaterConfig;
use optimist_core::{BoxError, Record, RecordId, Result, VersionedStore};
use optimist_storage::{MemoryStore, StatsSnapshot};

/// Id of the shared record
pub const COUNTER_ID: &str = "x";

/// Payload of the shared record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Counter {
    /// Number of committed increments
    pub counter: u64,
}

/// What one run should do
#[derive(Debug, Clone)]
pub struct ContendSettings {
    /// Concurrent callers
    pub callers: usize,
    /// Updates per caller
    pub increments: usize,
    /// Retry policy and timeout
    pub config: UpdaterConfig,
}

impl ContendSettings {
    /// Build settings from `contend` matches; flags override the config file
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let mut config = match matches.get_one::<String>("config") {
            Some(path) => UpdaterConfig::load(path)?,
            None => UpdaterConfig::default(),
        };

        if matches.get_flag("unbounded") {
            config.retry.unbounded = true;
        }
        if let Some(&n) = matches.get_one::<usize>("max-retries") {
            config.retry.unbounded = false;
            config.retry.max_retries = Some(n);
        }
        if let Some(&ms) = matches.get_one::<u64>("base-delay-ms") {
            config.retry.base_delay_ms = ms;
        }
        if let Some(&ms) = matches.get_one::<u64>("max-delay-ms") {
            config.retry.max_delay_ms = ms;
        }
        if matches.get_flag("no-jitter") {
            config.retry.jitter = false;
        }
        if let Some(&ms) = matches.get_one::<u64>("timeout-ms") {
            config.timeout_ms = Some(ms);
        }
        config.validate()?;

        Ok(Self {
            callers: *matches.get_one::<usize>("callers").unwrap_or(&10),
            increments: *matches.get_one::<usize>("increments").unwrap_or(&1),
            config,
        })
    }

    /// Increments expected if every update commits
    pub fn expected(&self) -> u64 {
        (self.callers as u64).saturating_mul(self.increments as u64)
    }
}

/// Per-caller totals
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallerTally {
    /// Updates that committed
    pub committed: u64,
    /// Updates that ended in a terminal error
    pub failed: u64,
    /// Attempts made by committed updates
    pub attempts: u64,
    /// Most attempts a single committed update needed
    pub max_attempts: u64,
    /// Versions this caller committed, in order
    pub versions: Vec<u64>,
    /// Terminal errors, rendered
    pub errors: Vec<String>,
}

/// Store counters in serializable form
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StoreReport {
    /// `get` calls
    pub gets: u64,
    /// `conditional_put` calls
    pub puts: u64,
    /// Committed writes
    pub commits: u64,
    /// Rejected writes
    pub mismatches: u64,
}

impl From<StatsSnapshot> for StoreReport {
    fn from(s: StatsSnapshot) -> Self {
        Self {
            gets: s.gets,
            puts: s.puts,
            commits: s.commits,
            mismatches: s.mismatches,
        }
    }
}

/// Outcome of a run
#[derive(Debug, Clone, Serialize)]
pub struct ContendReport {
    /// Concurrent callers
    pub callers: usize,
    /// Updates per caller
    pub increments: usize,
    /// `callers * increments`
    pub expected: u64,
    /// Final record
    pub record: Record<Counter>,
    /// Per-caller totals
    pub tallies: Vec<CallerTally>,
    /// Store counters
    pub store: StoreReport,
    /// Wall-clock time of the run in milliseconds
    pub elapsed_ms: u64,
}

impl ContendReport {
    /// Updates that committed across all callers
    pub fn committed(&self) -> u64 {
        self.tallies.iter().map(|t| t.committed).sum()
    }

    /// Updates that failed across all callers
    pub fn failed(&self) -> u64 {
        self.tallies.iter().map(|t| t.failed).sum()
    }

    /// Attempts made by committed updates across all callers
    pub fn attempts(&self) -> u64 {
        self.tallies.iter().map(|t| t.attempts).sum()
    }

    /// Every committed increment is in the final record and each commit
    /// produced exactly one version
    pub fn is_consistent(&self) -> bool {
        let committed = self.committed();
        self.record.payload.counter == committed && self.record.version.as_u64() == committed
    }

    /// Every update committed
    pub fn is_complete(&self) -> bool {
        self.record.payload.counter == self.expected
    }
}

fn increment(record: &Record<Counter>) -> std::result::Result<Record<Counter>, BoxError> {
    let counter = record
        .payload
        .counter
        .checked_add(1)
        .ok_or("counter overflow")?;
    Ok(Record {
        id: record.id.clone(),
        version: record.version,
        payload: Counter { counter },
    })
}

/// Run the contention scenario
pub fn run(settings: &ContendSettings) -> Result<ContendReport> {
    let store = Arc::new(MemoryStore::new());
    store.insert(Record::new(COUNTER_ID, Counter { counter: 0 }))?;
    let updater = settings.config.build(Arc::clone(&store));
    let id = RecordId::from(COUNTER_ID);

    info!(
        target: "optimist::cli",
        callers = settings.callers,
        increments = settings.increments,
        retry = ?updater.config(),
        "Starting contention run"
    );

    let started = Instant::now();
    let tallies: Vec<CallerTally> = thread::scope(|scope| {
        let handles: Vec<_> = (0..settings.callers)
            .map(|_| {
                let updater = &updater;
                let id = &id;
                let config = &settings.config;
                scope.spawn(move || {
                    let mut tally = CallerTally::default();
                    for _ in 0..settings.increments {
                        match updater.update_with(id, &config.update_options(), increment) {
                            Ok(outcome) => {
                                let attempts = outcome.attempts as u64;
                                tally.committed += 1;
                                tally.attempts += attempts;
                                tally.max_attempts = tally.max_attempts.max(attempts);
                                tally.versions.push(outcome.record.version.as_u64());
                            }
                            Err(e) => {
                                tally.failed += 1;
                                tally.errors.push(e.to_string());
                            }
                        }
                    }
                    tally
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(tally) => tally,
                Err(_) => CallerTally {
                    failed: settings.increments as u64,
                    errors: vec!["caller thread panicked".to_string()],
                    ..CallerTally::default()
                },
            })
            .collect()
    });
    let elapsed = started.elapsed();

    let record = store.get(&id)?;
    let report = ContendReport {
        callers: settings.callers,
        increments: settings.increments,
        expected: settings.expected(),
        record,
        tallies,
        store: store.stats().snapshot().into(),
        elapsed_ms: elapsed.as_millis() as u64,
    };

    info!(
        target: "optimist::cli",
        committed = report.committed(),
        failed = report.failed(),
        elapsed = ?elapsed,
        "Contention run finished"
    );
    Ok(report)
}
