//! Store operation counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters of store operations
#[derive(Debug, Default)]
pub struct StoreStats {
    gets: AtomicU64,
    puts: AtomicU64,
    commits: AtomicU64,
    mismatches: AtomicU64,
}

/// Point-in-time copy of `StoreStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// `get` calls served
    pub gets: u64,
    /// `conditional_put` calls received
    pub puts: u64,
    /// Conditional writes that committed
    pub commits: u64,
    /// Conditional writes rejected on version mismatch
    pub mismatches: u64,
}

impl StoreStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_get(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_mismatch(&self) {
        self.mismatches.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            gets: self.gets.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            mismatches: self.mismatches.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "gets={} puts={} commits={} mismatches={}",
            self.gets, self.puts, self.commits, self.mismatches
        )
    }
}
