//! Worker pool — a fixed set of workers draining one shared task queue.
//!
//! Core components:
//! - `task` — the Task contract (clone + run) and the per-run context
//! - `queue` — FIFO of pending tasks with the outstanding-work barrier
//! - `state` — Worker state machine (Idle → Running → Idle … → Stopped)
//! - `worker` — the loop each worker runs
//! - `stats` — pool-wide counters

pub mod queue;
pub mod state;
pub mod stats;
pub mod task;
pub mod worker;

pub use queue::{QueuedTask, TaskQueue};
pub use state::WorkerState;
pub use stats::{PoolStats, StatsSnapshot};
pub use task::{CloneTask, Task, TaskContext};
pub use worker::{Worker, WorkerDeps};

use worker::panic_message;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::RwLock;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::PoolConfig;
use crate::error::{Error, PoolError};

/// Tracked worker thread.
struct WorkerHandle {
    name: String,
    state: Arc<RwLock<WorkerState>>,
    thread: JoinHandle<()>,
}

/// A bounded, static-size pool of workers.
///
/// Each worker owns a dedicated OS thread that drives its loop on the
/// caller's tokio runtime, so a task that blocks its thread only holds up
/// its own worker. Workers start as soon as the pool is built and live until
/// [`WorkerPool::shutdown`] or drop. At most `worker_count` tasks run at the
/// same time.
pub struct WorkerPool {
    config: PoolConfig,
    queue: Arc<TaskQueue>,
    stats: Arc<PoolStats>,
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<WorkerHandle>,
}

impl WorkerPool {
    /// Create the pool and start `config.worker_count` workers immediately.
    ///
    /// Must be called from within a multi-threaded tokio runtime: the
    /// current-thread flavor only drives timers and I/O while its own thread
    /// is inside `block_on`, which worker threads cannot rely on.
    pub fn new(config: PoolConfig) -> Result<Self, Error> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| PoolError::NoRuntime)?;
        if runtime.runtime_flavor() == RuntimeFlavor::CurrentThread {
            return Err(PoolError::UnsupportedRuntime.into());
        }

        let queue = Arc::new(TaskQueue::new());
        let stats = Arc::new(PoolStats::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let deps = WorkerDeps {
            queue: Arc::clone(&queue),
            stats: Arc::clone(&stats),
            shutdown: shutdown_rx,
        };

        let mut workers = Vec::with_capacity(config.worker_count);
        for id in 0..config.worker_count {
            let name = format!("{}-worker-{}", config.name, id + 1);
            let worker = Worker::new(id, name.clone(), deps.clone());
            let state = worker.state_handle();
            let runtime = runtime.clone();

            // On error, dropping `shutdown_tx` stops the threads already started.
            let thread = thread::Builder::new()
                .name(name.clone())
                .spawn(move || runtime.block_on(worker.run()))
                .map_err(|e| PoolError::WorkerSpawn {
                    worker: name.clone(),
                    reason: e.to_string(),
                })?;

            workers.push(WorkerHandle {
                name,
                state,
                thread,
            });
        }

        tracing::info!(
            pool = %config.name,
            workers = config.worker_count,
            "Worker pool started"
        );

        Ok(Self {
            config,
            queue,
            stats,
            shutdown_tx,
            workers,
        })
    }

    /// Create a pool with `worker_count` workers and default settings.
    pub fn with_workers(worker_count: usize) -> Result<Self, Error> {
        Self::new(PoolConfig::with_workers(worker_count))
    }

    /// Queue a task for execution. Safe to call from many tasks at once.
    pub fn submit(&self, task: Box<dyn Task>) -> Result<Uuid, PoolError> {
        if *self.shutdown_tx.borrow() {
            return Err(PoolError::ShutDown);
        }

        let kind = task.kind();
        self.stats.record_submitted();
        let task_id = self.queue.enqueue(task);

        tracing::debug!(pool = %self.config.name, task_id = %task_id, kind, "Task submitted");
        Ok(task_id)
    }

    /// Clone `prototype` and submit the copy. The prototype is left untouched.
    pub fn submit_clone(&self, prototype: &dyn Task) -> Result<Uuid, PoolError> {
        self.submit(prototype.clone_task())
    }

    /// Wait until every submitted task has finished, failed ones included.
    ///
    /// Returns immediately when nothing is outstanding.
    pub async fn wait_completion(&self) {
        self.queue.wait_until_drained().await;
    }

    /// Stop the pool cooperatively and return the final counters.
    ///
    /// Workers finish the task they are running, then exit. Tasks still
    /// waiting in the queue are discarded. A worker still busy after
    /// `shutdown_timeout` is reported at warn and waited for; an in-flight
    /// task is never abandoned.
    pub async fn shutdown(mut self) -> Result<StatsSnapshot, PoolError> {
        self.shutdown_tx.send_replace(true);

        let discarded = self.queue.discard_pending();
        if discarded > 0 {
            tracing::warn!(
                pool = %self.config.name,
                discarded,
                "Discarded queued tasks at shutdown"
            );
        }

        let timeout = self.config.shutdown_timeout;
        let mut first_error = None;
        for worker in std::mem::take(&mut self.workers) {
            let thread = worker.thread;
            let mut join = tokio::task::spawn_blocking(move || thread.join());

            let joined = match tokio::time::timeout(timeout, &mut join).await {
                Ok(joined) => joined,
                Err(_) => {
                    tracing::warn!(
                        worker = %worker.name,
                        timeout_secs = timeout.as_secs_f64(),
                        "Worker still running a task after shutdown timeout, waiting for it"
                    );
                    join.await
                }
            };

            let reason = match joined {
                Ok(Ok(())) => None,
                Ok(Err(panic)) => Some(panic_message(panic.as_ref())),
                Err(e) => Some(e.to_string()),
            };
            if let Some(reason) = reason {
                tracing::error!(worker = %worker.name, "Worker join failed: {}", reason);
                if first_error.is_none() {
                    first_error = Some(PoolError::WorkerJoin {
                        worker: worker.name.clone(),
                        reason,
                    });
                }
            }
        }

        let snapshot = self.stats.snapshot();
        tracing::info!(
            pool = %self.config.name,
            completed = snapshot.completed,
            failed = snapshot.failed,
            "Worker pool shut down"
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(snapshot),
        }
    }

    /// Pool name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configured number of workers.
    pub fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    /// Current state of every worker, in worker order.
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.workers.iter().map(|w| *w.state.read()).collect()
    }

    /// Current counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Tasks waiting to be picked up.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Tasks submitted but not yet finished.
    pub fn outstanding(&self) -> usize {
        self.queue.outstanding()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Workers notice the flag (or the closed channel) once they are idle.
        self.shutdown_tx.send_replace(true);
    }
}
