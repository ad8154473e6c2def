//! Filter-level throttling statistics.
//!
//! The filter bumps these counters as it decides records; any clone of
//! the handle can watch from outside (a health probe, a test) without
//! touching the filter itself. Counts are monotonic over the filter's
//! lifetime and say nothing about individual groups — per-group reporting
//! is the notifier's job.

use crate::domain::limiter::Decision;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cloneable handle onto one filter's counters.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    passed: AtomicU64,
    suppressed: AtomicU64,
    evicted: AtomicU64,
}

impl Metrics {
    /// Create a fresh set of counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one decided record.
    ///
    /// Observe-only mode counts suppressions the same way; the counters
    /// track decisions, not whether the record was actually withheld.
    pub(crate) fn record(&self, decision: Decision) {
        let counter = match decision {
            Decision::Pass => &self.counters.passed,
            Decision::Suppress => &self.counters.suppressed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Account one group taken by the idle reaper.
    pub(crate) fn record_eviction(&self) {
        self.counters.evicted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records passed through so far.
    pub fn records_passed(&self) -> u64 {
        self.counters.passed.load(Ordering::Relaxed)
    }

    /// Records suppressed so far.
    pub fn records_suppressed(&self) -> u64 {
        self.counters.suppressed.load(Ordering::Relaxed)
    }

    /// Idle groups evicted so far.
    pub fn groups_evicted(&self) -> u64 {
        self.counters.evicted.load(Ordering::Relaxed)
    }

    /// Read all counters at once.
    ///
    /// Each counter is loaded independently, so a snapshot taken while
    /// records are in flight can be off by the records decided in
    /// between; for a single-threaded filter it is exact.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_passed: self.records_passed(),
            records_suppressed: self.records_suppressed(),
            groups_evicted: self.groups_evicted(),
        }
    }
}

/// One reading of a filter's counters.
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    /// Records passed through.
    pub records_passed: u64,
    /// Records suppressed.
    pub records_suppressed: u64,
    /// Idle groups evicted.
    pub groups_evicted: u64,
}

impl MetricsSnapshot {
    /// Records decided: passed plus suppressed.
    pub fn total_records(&self) -> u64 {
        self.records_passed.saturating_add(self.records_suppressed)
    }

    /// Fraction of decided records that were suppressed, in `[0.0, 1.0]`.
    /// Zero before any record has been decided.
    pub fn suppression_rate(&self) -> f64 {
        match self.total_records() {
            0 => 0.0,
            total => self.records_suppressed as f64 / total as f64,
        }
    }
}
