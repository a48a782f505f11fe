//! Pool counters.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// Live counters shared by the pool and its workers.
#[derive(Debug, Default)]
pub struct PoolStats {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    running: AtomicUsize,
    peak_running: AtomicUsize,
}

impl PoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark a task as started and update the high-water mark.
    pub(crate) fn task_started(&self) {
        let now = self.running.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_running.fetch_max(now, Ordering::AcqRel);
    }

    /// Mark a task as finished, successfully or not.
    pub(crate) fn task_finished(&self, succeeded: bool) {
        self.running.fetch_sub(1, Ordering::AcqRel);
        if succeeded {
            self.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            running: self.running.load(Ordering::Acquire),
            peak_running: self.peak_running.load(Ordering::Acquire),
        }
    }
}

/// Serializable copy of [`PoolStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub running: usize,
    /// Most tasks ever observed running at the same time.
    pub peak_running: usize,
}

impl StatsSnapshot {
    /// Tasks that have run to the end, failed ones included.
    pub fn finished(&self) -> u64 {
        self.completed + self.failed
    }
}
