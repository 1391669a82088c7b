//! Progress accounting for a pipeline run
//!
//! Two independent `{done, total}` counter pairs: one for day aggregators,
//! one for filter tasks. Task totals are unknown up front; each scanned hour
//! raises the total by the number of files it matched, so raising a total
//! must never disturb the done count. Everything is atomic so tasks can
//! increment from many tokio workers while the driver keeps raising totals.

use crate::types::ProgressSnapshot;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// A single grow-only `{done, total}` counter pair
#[derive(Debug, Default)]
struct Counter {
    done: AtomicU64,
    total: AtomicU64,
}

impl Counter {
    fn add_total(&self, n: u64) {
        self.total.fetch_add(n, Ordering::Relaxed);
    }

    fn inc_done(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }

    fn load(&self) -> (u64, u64) {
        (
            self.done.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }
}

/// Shared progress state for one pipeline run
///
/// Cheap to share behind an `Arc`; every dispatched unit holds a reference
/// and increments its counter exactly once on completion.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    days: Counter,
    tasks: Counter,
    finished: AtomicBool,
}

impl ProgressTracker {
    /// Create a tracker with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the task total by `n` newly discovered files
    pub fn add_tasks(&self, n: u64) {
        self.tasks.add_total(n);
    }

    /// Record one finished filter task (success or failure)
    pub fn task_done(&self) {
        self.tasks.inc_done();
    }

    /// Raise the day total by `n` newly dispatched aggregators
    pub fn add_days(&self, n: u64) {
        self.days.add_total(n);
    }

    /// Record one finished day aggregator
    pub fn day_done(&self) {
        self.days.inc_done();
    }

    /// Mark the run complete; `snapshot` reports `finished` from here on
    pub fn finalize(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }

    /// Current counter values
    pub fn snapshot(&self) -> ProgressSnapshot {
        let (days_done, days_total) = self.days.load();
        let (tasks_done, tasks_total) = self.tasks.load();
        ProgressSnapshot {
            days_done,
            days_total,
            tasks_done,
            tasks_total,
            finished: self.finished.load(Ordering::Relaxed),
        }
    }
}
