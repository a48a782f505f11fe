//! Task queue — shared FIFO of pending tasks with a completion barrier.
//!
//! Every enqueued task bumps an outstanding-work counter; workers call
//! [`TaskQueue::mark_done`] once the task has finished (successfully or not).
//! [`TaskQueue::wait_until_drained`] releases once that counter reaches zero,
//! i.e. every task has been both dequeued and marked done.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{Notify, watch};
use uuid::Uuid;

use crate::error::PoolError;
use crate::pool::task::Task;

/// A task waiting in (or just taken from) the queue.
#[derive(Debug)]
pub struct QueuedTask {
    pub id: Uuid,
    pub enqueued_at: DateTime<Utc>,
    pub task: Box<dyn Task>,
}

/// Unbounded FIFO of pending tasks.
pub struct TaskQueue {
    pending: Mutex<VecDeque<QueuedTask>>,
    available: Notify,
    outstanding: watch::Sender<usize>,
}

impl TaskQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (outstanding, _rx) = watch::channel(0);
        Self {
            pending: Mutex::new(VecDeque::new()),
            available: Notify::new(),
            outstanding,
        }
    }

    /// Append a task to the tail. Never blocks.
    pub fn enqueue(&self, task: Box<dyn Task>) -> Uuid {
        let queued = QueuedTask {
            id: Uuid::new_v4(),
            enqueued_at: Utc::now(),
            task,
        };
        let id = queued.id;

        // Count before the task becomes visible so a fast worker can never
        // mark it done ahead of the increment.
        self.outstanding.send_modify(|n| *n += 1);
        self.pending.lock().push_back(queued);
        self.available.notify_one();

        tracing::trace!(task_id = %id, "Task enqueued");
        id
    }

    /// Remove and return the head, waiting until one is available.
    ///
    /// Cancel safe: dropping the future never loses a task.
    pub async fn dequeue(&self) -> QueuedTask {
        loop {
            let notified = self.available.notified();
            if let Some(queued) = self.try_dequeue() {
                return queued;
            }
            notified.await;
        }
    }

    /// Remove and return the head if there is one.
    pub fn try_dequeue(&self) -> Option<QueuedTask> {
        let mut pending = self.pending.lock();
        let queued = pending.pop_front();
        // Hand the wakeup on if more work is left behind us.
        if queued.is_some() && !pending.is_empty() {
            self.available.notify_one();
        }
        queued
    }

    /// Record that a previously dequeued task has finished.
    pub fn mark_done(&self) -> Result<(), PoolError> {
        let mut underflow = false;
        self.outstanding.send_if_modified(|n| {
            if *n == 0 {
                underflow = true;
                false
            } else {
                *n -= 1;
                true
            }
        });

        if underflow {
            return Err(PoolError::MarkDoneUnderflow);
        }
        Ok(())
    }

    /// Wait until every enqueued task has been dequeued and marked done.
    ///
    /// Returns immediately when nothing is outstanding.
    pub async fn wait_until_drained(&self) {
        let mut rx = self.outstanding.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// Drop every task that has not been picked up yet, returning how many.
    ///
    /// Discarded tasks are removed from the outstanding counter so that
    /// drain waiters are not left hanging.
    pub(crate) fn discard_pending(&self) -> usize {
        let discarded = {
            let mut pending = self.pending.lock();
            let count = pending.len();
            pending.clear();
            count
        };
        if discarded > 0 {
            self.outstanding
                .send_modify(|n| *n = n.saturating_sub(discarded));
        }
        discarded
    }

    /// Number of tasks waiting to be picked up.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Whether no task is waiting to be picked up.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Tasks accepted but not yet marked done (waiting plus in flight).
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::TaskError;
    use crate::pool::task::TaskContext;

    #[derive(Clone)]
    struct Named(String);

    #[async_trait]
    impl Task for Named {
        fn kind(&self) -> &'static str {
            "named"
        }

        fn label(&self) -> String {
            self.0.clone()
        }

        async fn run(&mut self, _ctx: &TaskContext) -> Result<(), TaskError> {
            Ok(())
        }
    }

    fn named(label: &str) -> Box<dyn Task> {
        Box::new(Named(label.to_string()))
    }

    #[tokio::test]
    async fn fifo_order() {
        let queue = TaskQueue::new();
        queue.enqueue(named("a"));
        queue.enqueue(named("b"));
        queue.enqueue(named("c"));

        let order: Vec<String> = vec![
            queue.dequeue().await.task.label(),
            queue.dequeue().await.task.label(),
            queue.dequeue().await.task.label(),
        ];
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn outstanding_tracks_enqueue_and_done() {
        let queue = TaskQueue::new();
        queue.enqueue(named("a"));
        queue.enqueue(named("b"));
        assert_eq!(queue.outstanding(), 2);

        // Dequeueing alone does not reduce outstanding work.
        queue.try_dequeue().unwrap();
        assert_eq!(queue.outstanding(), 2);
        assert_eq!(queue.len(), 1);

        queue.mark_done().unwrap();
        assert_eq!(queue.outstanding(), 1);
    }

    #[test]
    fn mark_done_underflow_rejected() {
        let queue = TaskQueue::new();
        assert!(matches!(queue.mark_done(), Err(PoolError::MarkDoneUnderflow)));
        assert_eq!(queue.outstanding(), 0);
    }

    #[tokio::test]
    async fn drained_returns_immediately_when_empty() {
        let queue = TaskQueue::new();
        tokio::time::timeout(Duration::from_millis(100), queue.wait_until_drained())
            .await
            .expect("wait_until_drained should not block on an empty queue");
    }

    #[tokio::test]
    async fn drained_waits_for_in_flight_work() {
        let queue = Arc::new(TaskQueue::new());
        queue.enqueue(named("a"));
        let _taken = queue.try_dequeue().unwrap();

        // Queue is empty but the task is still in flight.
        assert!(queue.is_empty());
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), queue.wait_until_drained()).await;
        assert!(blocked.is_err());

        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.wait_until_drained().await })
        };
        queue.mark_done().unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should be released")
            .unwrap();
    }

    #[tokio::test]
    async fn dequeue_wakes_on_enqueue() {
        let queue = Arc::new(TaskQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.dequeue().await.task.label() })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.enqueue(named("late"));

        let label = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer should wake")
            .unwrap();
        assert_eq!(label, "late");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_consumers_take_each_task_once() {
        let queue = Arc::new(TaskQueue::new());
        let total = 200;

        let mut consumers = Vec::new();
        for _ in 0..4 {
            let queue = Arc::clone(&queue);
            consumers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                loop {
                    let queued = queue.dequeue().await;
                    let label = queued.task.label();
                    queue.mark_done().unwrap();
                    if label == "stop" {
                        break;
                    }
                    seen.push(label);
                }
                seen
            }));
        }

        for i in 0..total {
            queue.enqueue(named(&i.to_string()));
        }
        for _ in 0..4 {
            queue.enqueue(named("stop"));
        }

        let mut all = Vec::new();
        for consumer in consumers {
            all.extend(consumer.await.unwrap());
        }
        all.sort_by_key(|s| s.parse::<usize>().unwrap());
        let expected: Vec<String> = (0..total).map(|i| i.to_string()).collect();
        assert_eq!(all, expected);
        assert_eq!(queue.outstanding(), 0);
    }

    #[test]
    fn discard_pending_releases_counter() {
        let queue = TaskQueue::new();
        queue.enqueue(named("a"));
        queue.enqueue(named("b"));
        let _in_flight = queue.try_dequeue().unwrap();

        assert_eq!(queue.discard_pending(), 1);
        assert_eq!(queue.outstanding(), 1);
        assert!(queue.is_empty());
    }
}
