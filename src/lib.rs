//! Prototype-based worker pool.
//!
//! Task prototypes are built once, cloned into independent instances and run
//! by a fixed set of workers pulling from one shared FIFO queue.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod pool;
pub mod tasks;

pub use config::PoolConfig;
pub use dispatch::{DispatchReport, Dispatcher};
pub use error::{Error, Result};
pub use pool::{Task, TaskContext, WorkerPool};
