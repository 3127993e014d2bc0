//! Worker execution engine for running jobs.
//!
//! Workers are tokio tasks that share one [`JobQueue`](crate::scheduler::JobQueue):
//! - **Worker loop**: pulls jobs in FIFO order and records each status change
//! - **Executor**: runs a job on its own task and maps the outcome to
//!   `Done`/`Failed`, containing panics
//!
//! # Execution Flow
//!
//! 1. [`run_worker`] waits for the next job
//! 2. Marks it `Processing` in the ledger
//! 3. [`JobExecutor::execute`] runs it once, no retries
//! 4. Marks it `Done` or `Failed`
//!
//! The loop ends only when the queue is closed and drained.

pub mod executor;
pub mod pool;

pub use executor::{ExecutionResult, JobExecutor};
pub use pool::{run_worker, WorkerPool};
