//! Error types for protopool.

/// Top-level error type for the pool.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Failures raised from inside a task's `run`.
///
/// These never leave the worker that caught them; they are logged and counted.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Task {kind} execution failed: {reason}")]
    ExecutionFailed { kind: String, reason: String },

    #[error("Invalid input for task {kind}: {reason}")]
    InvalidInput { kind: String, reason: String },

    #[error("Task {kind} ({label}) panicked: {message}")]
    Panicked {
        kind: String,
        label: String,
        message: String,
    },
}

/// Worker pool and queue errors.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("Worker pool is shut down")]
    ShutDown,

    #[error("No tokio runtime available to spawn workers")]
    NoRuntime,

    #[error("Worker pool requires a multi-threaded tokio runtime")]
    UnsupportedRuntime,

    #[error("Failed to spawn worker {worker}: {reason}")]
    WorkerSpawn { worker: String, reason: String },

    #[error("mark_done called more times than tasks were enqueued")]
    MarkDoneUnderflow,

    #[error("Worker {worker} failed to join: {reason}")]
    WorkerJoin { worker: String, reason: String },
}

/// Result type alias for the pool.
pub type Result<T> = std::result::Result<T, Error>;
