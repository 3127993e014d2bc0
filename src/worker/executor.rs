use tokio::task::JoinError;

use crate::error::{RelayError, Result};
use crate::scheduler::queue::BoxedJob;
use crate::scheduler::{JobId, JobStatus};

/// Result of job execution
#[derive(Debug)]
pub struct ExecutionResult {
    pub job_id: JobId,
    pub status: JobStatus,
    pub error: Option<String>,
}

/// Runs a single job to completion and maps its outcome to a terminal status.
///
/// The job runs on its own task so that a panic inside `execute` is reported
/// as a failure instead of unwinding through the worker loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobExecutor;

impl JobExecutor {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self, job: BoxedJob) -> ExecutionResult {
        let job_id = job.id().clone();
        tracing::info!(job_id = %job_id, "Executing job");

        let joined = tokio::spawn(async move { job.execute().await }).await;

        match join_outcome(joined) {
            Ok(()) => {
                tracing::info!(job_id = %job_id, status = %JobStatus::Done, "Job completed");
                ExecutionResult {
                    job_id,
                    status: JobStatus::Done,
                    error: None,
                }
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Job execution failed");
                ExecutionResult {
                    job_id,
                    status: JobStatus::Failed,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn join_outcome(joined: std::result::Result<Result<()>, JoinError>) -> Result<()> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(RelayError::JobPanicked(panic_message(e))),
        Err(_) => Err(RelayError::JobCancelled),
    }
}

fn panic_message(err: JoinError) -> String {
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
