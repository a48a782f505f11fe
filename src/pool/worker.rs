//! Per-worker execution loop.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use parking_lot::RwLock;
use tokio::sync::watch;

use crate::error::TaskError;
use crate::pool::queue::{QueuedTask, TaskQueue};
use crate::pool::state::WorkerState;
use crate::pool::stats::PoolStats;
use crate::pool::task::TaskContext;

/// Shared dependencies for worker execution.
#[derive(Clone)]
pub struct WorkerDeps {
    pub queue: Arc<TaskQueue>,
    pub stats: Arc<PoolStats>,
    /// Flips to `true` when the pool asks its workers to stop.
    pub shutdown: watch::Receiver<bool>,
}

/// A long-lived worker draining the shared queue.
pub struct Worker {
    id: usize,
    name: String,
    state: Arc<RwLock<WorkerState>>,
    deps: WorkerDeps,
}

impl Worker {
    /// Create a new worker. It starts idle.
    pub fn new(id: usize, name: impl Into<String>, deps: WorkerDeps) -> Self {
        Self {
            id,
            name: name.into(),
            state: Arc::new(RwLock::new(WorkerState::Idle)),
            deps,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle for observing this worker's state from outside its task.
    pub fn state_handle(&self) -> Arc<RwLock<WorkerState>> {
        Arc::clone(&self.state)
    }

    /// Run until the pool signals shutdown (or goes away).
    ///
    /// The stop signal is only observed while idle; a task that has been
    /// dequeued always runs to the end first.
    pub async fn run(mut self) {
        tracing::debug!(worker = %self.name, "Worker started");

        loop {
            let queued = tokio::select! {
                biased;
                _ = stop_requested(&mut self.deps.shutdown) => break,
                queued = self.deps.queue.dequeue() => queued,
            };
            self.execute(queued).await;
        }

        self.transition(WorkerState::Stopped);
        tracing::debug!(worker = %self.name, "Worker stopped");
    }

    async fn execute(&self, queued: QueuedTask) {
        let id = queued.id;

        self.transition(WorkerState::Running);
        self.deps.stats.task_started();

        // Any task code (kind, label, drop) may panic, not just `run`.
        let succeeded = match AssertUnwindSafe(self.run_task(queued)).catch_unwind().await {
            Ok(succeeded) => succeeded,
            Err(panic) => {
                tracing::error!(
                    worker = %self.name,
                    task_id = %id,
                    error = %panic_message(panic.as_ref()),
                    "Task panicked outside run"
                );
                false
            }
        };

        self.deps.stats.task_finished(succeeded);

        // Idle before mark_done, so a released drain waiter sees settled state.
        self.transition(WorkerState::Idle);

        if let Err(e) = self.deps.queue.mark_done() {
            tracing::warn!(worker = %self.name, task_id = %id, "Failed to mark task done: {}", e);
        }
    }

    /// Run one task and log its outcome. Returns whether it succeeded.
    async fn run_task(&self, queued: QueuedTask) -> bool {
        let QueuedTask {
            id,
            enqueued_at,
            mut task,
        } = queued;

        let ctx = TaskContext {
            task_id: id,
            worker_id: self.id,
            worker_name: self.name.clone(),
            enqueued_at,
            started_at: Utc::now(),
        };
        let kind = task.kind();
        let label = task.label();

        tracing::debug!(
            worker = %self.name,
            task_id = %id,
            kind,
            label = %label,
            queue_wait_ms = ctx.queue_wait().as_millis() as u64,
            "Task started"
        );

        let start = Instant::now();
        let result = match AssertUnwindSafe(task.run(&ctx)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(TaskError::Panicked {
                kind: kind.to_string(),
                label: label.clone(),
                message: panic_message(panic.as_ref()),
            }),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(()) => tracing::info!(
                worker = %self.name,
                task_id = %id,
                kind,
                label = %label,
                elapsed_ms,
                "Task completed"
            ),
            Err(e) => tracing::error!(
                worker = %self.name,
                task_id = %id,
                kind,
                label = %label,
                elapsed_ms,
                error = %e,
                "Task failed"
            ),
        }

        // The instance is discarded once it has run.
        drop(task);
        result.is_ok()
    }

    fn transition(&self, target: WorkerState) {
        let mut state = self.state.write();
        if !state.can_transition_to(target) {
            tracing::warn!(
                worker = %self.name,
                from = %*state,
                to = %target,
                "Ignoring invalid worker state transition"
            );
            return;
        }
        *state = target;
    }
}

async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    // A closed channel means the pool is gone, which is a stop as well.
    let _ = shutdown.wait_for(|stop| *stop).await;
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
