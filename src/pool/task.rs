//! The Task contract: what a worker needs from a unit of work.
//!
//! A task is built once as a prototype (paying any expensive setup up front),
//! then duplicated with [`CloneTask::clone_task`] into independent instances.
//! Each instance is owned by exactly one worker while it runs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::TaskError;

/// A polymorphic unit of work executed by the pool.
///
/// Implementors must own all of their state. `Clone` on a task kind has to be
/// a deep duplication: clones run concurrently, so no mutable sub-state may be
/// shared between them.
#[async_trait]
pub trait Task: CloneTask + Send + 'static {
    /// Stable name of the task kind, used in logs.
    fn kind(&self) -> &'static str;

    /// Identifying context for this particular instance (a path, a recipient).
    fn label(&self) -> String;

    /// Execute the unit of work.
    ///
    /// Runs on the owning worker's dedicated thread, so blocking calls here
    /// stall only that worker.
    async fn run(&mut self, ctx: &TaskContext) -> Result<(), TaskError>;
}

/// Object-safe duplication for boxed tasks.
///
/// Implemented for every `Task + Clone`; task kinds only derive `Clone`.
pub trait CloneTask {
    fn clone_task(&self) -> Box<dyn Task>;
}

impl<T> CloneTask for T
where
    T: Task + Clone,
{
    fn clone_task(&self) -> Box<dyn Task> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Task> {
    fn clone(&self) -> Self {
        self.clone_task()
    }
}

impl std::fmt::Debug for dyn Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("kind", &self.kind())
            .field("label", &self.label())
            .finish()
    }
}

/// Execution context handed to [`Task::run`] by the worker that owns it.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Id assigned when the task was enqueued.
    pub task_id: Uuid,
    /// Index of the executing worker, `0..worker_count`.
    pub worker_id: usize,
    /// Human-readable worker name (`<pool>-worker-<n>`).
    pub worker_name: String,
    /// When the task entered the queue.
    pub enqueued_at: DateTime<Utc>,
    /// When the worker picked it up.
    pub started_at: DateTime<Utc>,
}

impl TaskContext {
    /// Time the task spent waiting in the queue.
    pub fn queue_wait(&self) -> Duration {
        self.started_at
            .signed_duration_since(self.enqueued_at)
            .to_std()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Tagged {
        tags: Vec<String>,
    }

    #[async_trait]
    impl Task for Tagged {
        fn kind(&self) -> &'static str {
            "tagged"
        }

        fn label(&self) -> String {
            self.tags.join(",")
        }

        async fn run(&mut self, _ctx: &TaskContext) -> Result<(), TaskError> {
            self.tags.push("ran".to_string());
            Ok(())
        }
    }

    fn ctx() -> TaskContext {
        let now = Utc::now();
        TaskContext {
            task_id: Uuid::new_v4(),
            worker_id: 0,
            worker_name: "test-worker-1".to_string(),
            enqueued_at: now,
            started_at: now,
        }
    }

    #[tokio::test]
    async fn boxed_clone_is_independent() {
        let prototype: Box<dyn Task> = Box::new(Tagged {
            tags: vec!["a".to_string()],
        });
        let mut copy = prototype.clone();
        copy.run(&ctx()).await.unwrap();

        assert_eq!(copy.label(), "a,ran");
        assert_eq!(prototype.label(), "a");
    }

    #[test]
    fn debug_shows_kind_and_label() {
        let task: Box<dyn Task> = Box::new(Tagged {
            tags: vec!["x".to_string()],
        });
        let rendered = format!("{task:?}");
        assert!(rendered.contains("tagged"));
        assert!(rendered.contains("x"));
    }

    #[test]
    fn queue_wait_never_negative() {
        let mut ctx = ctx();
        ctx.enqueued_at = ctx.started_at + chrono::Duration::seconds(5);
        assert_eq!(ctx.queue_wait(), Duration::ZERO);

        ctx.enqueued_at = ctx.started_at - chrono::Duration::milliseconds(250);
        assert_eq!(ctx.queue_wait(), Duration::from_millis(250));
    }
}
