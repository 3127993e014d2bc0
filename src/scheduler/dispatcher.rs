use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::DeliveryConfig;
use crate::delivery::{Deliver, DeliveryJob};
use crate::discovery::{Discover, MediaItem};
use crate::error::Result;
use crate::scheduler::job::JobId;
use crate::scheduler::queue::JobQueue;

/// Outcome of one batch dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Buffered jobs from the previous batch that were dropped.
    pub cleared: usize,
    /// Jobs enqueued for this batch.
    pub accepted: usize,
}

/// Turns discovered items into delivery jobs on a queue.
pub struct Dispatcher {
    queue: Arc<JobQueue>,
    deliverer: Arc<dyn Deliver>,
    config: DeliveryConfig,
    /// Background enqueue of the batch started by [`Dispatcher::start_batch`].
    running: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("queue", &self.queue)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(queue: Arc<JobQueue>, deliverer: Arc<dyn Deliver>, config: DeliveryConfig) -> Self {
        Self {
            queue,
            deliverer,
            config,
            running: Mutex::new(None),
        }
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    /// Stars attached to the item at `index` within its batch. Every
    /// `stars_every`-th item, starting with the first, goes out free.
    pub fn stars_for(&self, index: usize) -> u32 {
        let every = self.config.stars_every;
        if every > 0 && index % every == 0 {
            0
        } else {
            self.config.stars
        }
    }

    pub fn job_for(&self, index: usize, item: MediaItem) -> DeliveryJob {
        let id = JobId::for_item(&item.name, item.modified_at);
        DeliveryJob::new(id, item, self.stars_for(index), self.deliverer.clone())
    }

    /// Reset the queue ahead of a new batch.
    ///
    /// A batch still being enqueued in the background is stopped first, so
    /// none of its remaining items land in the queue after the reset.
    pub async fn clear(&self) -> usize {
        let mut running = self.running.lock().await;
        self.stop_and_clear(&mut running).await
    }

    async fn stop_and_clear(&self, running: &mut Option<JoinHandle<()>>) -> usize {
        if let Some(handle) = running.take() {
            handle.abort();
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "Previous batch task ended abnormally");
                }
            }
        }
        self.queue.clear()
    }

    /// Enqueue every item in order. Waits whenever the queue is full.
    pub async fn enqueue_all(&self, items: Vec<MediaItem>) -> Result<usize> {
        let mut accepted = 0;
        for (index, item) in items.into_iter().enumerate() {
            let job = self.job_for(index, item);
            self.queue.enqueue(job).await?;
            accepted += 1;
        }
        tracing::info!(accepted, "Batch enqueued");
        Ok(accepted)
    }

    /// Clear the queue, then enqueue `items` as a fresh batch.
    pub async fn dispatch(&self, items: Vec<MediaItem>) -> Result<BatchReport> {
        let cleared = self.clear().await;
        let accepted = self.enqueue_all(items).await?;
        Ok(BatchReport { cleared, accepted })
    }

    /// Clear the queue and enqueue `items` on a background task.
    ///
    /// Returns once the queue is reset. Starting another batch, or calling
    /// [`Dispatcher::clear`], aborts this one's remaining enqueues.
    pub async fn start_batch(self: &Arc<Self>, items: Vec<MediaItem>) -> BatchReport {
        let mut running = self.running.lock().await;
        let cleared = self.stop_and_clear(&mut running).await;
        let accepted = items.len();

        let dispatcher = Arc::clone(self);
        *running = Some(tokio::spawn(async move {
            if let Err(e) = dispatcher.enqueue_all(items).await {
                tracing::error!(error = %e, "Batch enqueue stopped early");
            }
        }));
        BatchReport { cleared, accepted }
    }

    /// Discover a batch and dispatch it. A discovery failure leaves the queue
    /// untouched.
    pub async fn dispatch_from(&self, source: &dyn Discover) -> Result<BatchReport> {
        let items = source.discover().await.map_err(|e| {
            tracing::warn!(error = %e, "Discovery failed, batch skipped");
            e
        })?;
        self.dispatch(items).await
    }
}
