use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::dashboard::{run_dashboard, DashboardState};
use crate::delivery::{Deliver, DryRunDelivery};
use crate::error::Result;
use crate::scheduler::{Dispatcher, JobQueue};
use crate::worker::WorkerPool;

/// Main node that orchestrates all components
pub struct Node {
    pub config: RelayConfig,
    pub job_queue: Arc<JobQueue>,
    pub dispatcher: Arc<Dispatcher>,
}

impl Node {
    /// Build a node that delivers through `deliverer`.
    pub fn new(config: RelayConfig, deliverer: Arc<dyn Deliver>) -> Self {
        let job_queue = Arc::new(JobQueue::with_capacity(config.queue_capacity));
        let dispatcher = Arc::new(Dispatcher::new(
            job_queue.clone(),
            deliverer,
            config.delivery.clone(),
        ));

        Self {
            config,
            job_queue,
            dispatcher,
        }
    }

    /// Build a node whose deliveries are only logged.
    pub fn dry_run(config: RelayConfig) -> Self {
        let deliverer = Arc::new(DryRunDelivery::new(config.delivery.channel.clone()));
        Self::new(config, deliverer)
    }

    pub fn dashboard_state(&self) -> DashboardState {
        DashboardState {
            queue: self.job_queue.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }

    /// Run the node until `shutdown` is cancelled.
    ///
    /// 1. Spawns the worker pool over the shared job queue
    /// 2. Serves the dashboard (status page, batch trigger, status overrides)
    /// 3. On shutdown, closes the queue so workers exit once the buffered
    ///    jobs are done, then waits for them
    ///
    /// # Errors
    ///
    /// Returns an error if the dashboard cannot bind or fails while serving.
    /// The queue is still closed and the workers joined in that case.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let workers = WorkerPool::spawn(self.config.workers, self.job_queue.clone());
        tracing::info!(
            workers = workers.len(),
            queue_capacity = self.job_queue.capacity(),
            "Worker pool started"
        );

        let served = run_dashboard(
            self.config.listen_addr,
            self.dashboard_state(),
            shutdown.clone(),
        )
        .await;
        if served.is_err() {
            shutdown.cancel();
        }

        self.job_queue.close();
        workers.join().await;
        tracing::info!("All workers stopped");
        served
    }
}
