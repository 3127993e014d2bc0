use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::scheduler::{JobQueue, JobStatus};
use crate::worker::executor::JobExecutor;

/// Pull jobs from `queue` until it is closed and empty.
///
/// Each job is marked `Processing`, executed once, then marked `Done` or
/// `Failed`. `worker_id` only shows up in logs.
pub async fn run_worker(worker_id: u64, queue: Arc<JobQueue>) {
    let executor = JobExecutor::new();
    tracing::info!(worker_id, "Worker started");

    while let Some(job) = queue.next_job().await {
        let job_id = job.id().clone();
        queue.update_status(job_id.clone(), JobStatus::Processing);
        tracing::debug!(worker_id, job_id = %job_id, "Job claimed");

        let result = executor.execute(job).await;
        queue.update_status(result.job_id, result.status);
    }

    tracing::info!(worker_id, "Worker stopped, queue closed");
}

/// A fixed set of workers sharing one queue.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `count` workers numbered from 1.
    pub fn spawn(count: usize, queue: Arc<JobQueue>) -> Self {
        let handles = (1..=count as u64)
            .map(|worker_id| {
                let queue = queue.clone();
                tokio::spawn(async move { run_worker(worker_id, queue).await })
            })
            .collect();
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker to exit. Only returns after the queue is closed.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Worker task ended abnormally");
            }
        }
    }
}
