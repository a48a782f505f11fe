//! Worker state machine.

use serde::{Deserialize, Serialize};

/// State of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Waiting on the queue for a task.
    Idle,
    /// Executing a task.
    Running,
    /// Exited after a shutdown signal.
    Stopped,
}

impl WorkerState {
    /// Check if this state allows transitioning to another state.
    ///
    /// A running worker must go back to idle before it can stop, so an
    /// in-progress task is never abandoned.
    pub fn can_transition_to(&self, target: WorkerState) -> bool {
        use WorkerState::*;

        matches!(
            (self, target),
            (Idle, Running) | (Running, Idle) | (Idle, Stopped)
        )
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}
