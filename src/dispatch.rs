//! Dispatcher — turns prototypes into submitted clones.

use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::error::PoolError;
use crate::pool::{StatsSnapshot, Task, WorkerPool};

/// Client side of the pool: clones prototypes, submits the clones, waits.
///
/// The dispatcher never submits a prototype itself, only copies of it.
pub struct Dispatcher<'a> {
    pool: &'a WorkerPool,
    submitted: Vec<Uuid>,
    started: Instant,
}

/// Outcome of a dispatch session.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// Ids of every task submitted through the dispatcher, in order.
    pub submitted: Vec<Uuid>,
    /// Wall-clock time from dispatcher creation to completion.
    pub elapsed: Duration,
    /// Pool counters once all work had finished.
    pub stats: StatsSnapshot,
}

impl<'a> Dispatcher<'a> {
    pub fn new(pool: &'a WorkerPool) -> Self {
        Self {
            pool,
            submitted: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Submit `count` clones of `prototype`.
    ///
    /// `customize` gets each clone (with its index) before submission, to set
    /// whatever distinguishes the instances, e.g. a target path.
    pub fn fan_out<T, F>(
        &mut self,
        prototype: &T,
        count: usize,
        mut customize: F,
    ) -> Result<Vec<Uuid>, PoolError>
    where
        T: Task + Clone,
        F: FnMut(usize, &mut T),
    {
        let mut ids = Vec::with_capacity(count);
        for index in 0..count {
            let mut task = prototype.clone();
            customize(index, &mut task);
            let id = self.pool.submit(Box::new(task))?;
            self.submitted.push(id);
            ids.push(id);
        }

        tracing::debug!(kind = prototype.kind(), count, "Fanned out prototype");

        Ok(ids)
    }

    /// Submit a single, already-built task.
    pub fn submit(&mut self, task: Box<dyn Task>) -> Result<Uuid, PoolError> {
        let id = self.pool.submit(task)?;
        self.submitted.push(id);
        Ok(id)
    }

    /// Ids submitted so far.
    pub fn submitted(&self) -> &[Uuid] {
        &self.submitted
    }

    /// Wait for the pool to finish everything and report.
    pub async fn finish(self) -> DispatchReport {
        self.pool.wait_completion().await;

        let report = DispatchReport {
            submitted: self.submitted,
            elapsed: self.started.elapsed(),
            stats: self.pool.stats(),
        };
        tracing::info!(
            submitted = report.submitted.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Dispatch finished"
        );
        report
    }
}
