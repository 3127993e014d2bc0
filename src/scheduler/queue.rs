use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::Notify;

use crate::error::{RelayError, Result};
use crate::scheduler::job::{Job, JobId, JobStatus};
use crate::scheduler::ledger::{StatusCounts, StatusLedger};

const DEFAULT_CAPACITY: usize = 100;

pub type BoxedJob = Box<dyn Job>;

/// Bounded FIFO of jobs paired with the status ledger.
///
/// Enqueue records `Queued` in the ledger in the same critical section that
/// pushes the job, so every buffered job has an entry and a job that never
/// made it onto the channel has none.
/// Neither the ledger lock nor the receiver lock is ever held across an
/// `.await`, so [`JobQueue::clear`] can drain the channel synchronously while
/// workers are parked waiting for work.
pub struct JobQueue {
    sender: RwLock<Option<mpsc::Sender<BoxedJob>>>,
    receiver: Mutex<mpsc::Receiver<BoxedJob>>,
    ledger: StatusLedger,
    /// Signalled when a job is pushed or the queue is closed.
    available: Notify,
    /// Jobs reserved into the channel and not yet taken by a worker or drained.
    buffered: AtomicUsize,
    closed: AtomicBool,
    capacity: usize,
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("capacity", &self.capacity)
            .field("pending", &self.pending())
            .field("ledger", &self.ledger)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            sender: RwLock::new(Some(tx)),
            receiver: Mutex::new(rx),
            ledger: StatusLedger::new(),
            available: Notify::new(),
            buffered: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            capacity,
        }
    }

    /// Record the job as `Queued` and push it onto the channel.
    ///
    /// Waits for space when the channel is full. Nothing is recorded until
    /// space is reserved, so dropping the future while it waits leaves the
    /// ledger untouched. Fails only once the queue has been closed.
    pub async fn enqueue<J: Job + 'static>(&self, job: J) -> Result<()> {
        self.enqueue_boxed(Box::new(job)).await
    }

    pub async fn enqueue_boxed(&self, job: BoxedJob) -> Result<()> {
        let sender = self.sender.read().clone().ok_or(RelayError::QueueClosed)?;
        let job_id = job.id().clone();

        let permit = sender
            .reserve()
            .await
            .map_err(|_| RelayError::QueueClosed)?;

        // Ledger entry and push happen under the ledger lock, which clear()
        // also holds while it drains.
        self.ledger.upsert_with(job_id.clone(), JobStatus::Queued, || {
            self.buffered.fetch_add(1, Ordering::SeqCst);
            permit.send(job);
        });
        tracing::debug!(job_id = %job_id, "Job enqueued");

        // The clone must be gone before waking workers so that a worker seeing
        // an empty channel after close() observes it as disconnected.
        drop(sender);
        if self.is_closed() {
            self.available.notify_waiters();
        } else {
            self.available.notify_one();
        }
        Ok(())
    }

    /// Wait for the next job in FIFO order. Returns `None` once the queue is
    /// closed and every buffered job has been taken.
    pub(crate) async fn next_job(&self) -> Option<BoxedJob> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut receiver = self.receiver.lock();
                match receiver.try_recv() {
                    Ok(job) => {
                        self.buffered.fetch_sub(1, Ordering::SeqCst);
                        if self.pending() > 0 {
                            self.available.notify_one();
                        }
                        return Some(job);
                    }
                    Err(TryRecvError::Disconnected) => return None,
                    Err(TryRecvError::Empty) => {}
                }
            }

            notified.await;
        }
    }

    /// Empty the ledger and drop every buffered job no worker has claimed yet.
    ///
    /// Jobs a worker already dequeued keep running and still record their
    /// terminal status afterwards. Returns the number of jobs dropped.
    pub fn clear(&self) -> usize {
        let drained = self.ledger.reset_with(|| {
            let mut receiver = self.receiver.lock();
            let mut drained = 0;
            while receiver.try_recv().is_ok() {
                drained += 1;
            }
            drained
        });
        self.buffered.fetch_sub(drained, Ordering::SeqCst);
        tracing::info!(drained, "Job queue cleared");
        drained
    }

    /// Stop accepting jobs. Workers finish what is already buffered and then
    /// exit.
    pub fn close(&self) {
        let sender = self.sender.write().take();
        if sender.is_some() {
            self.closed.store(true, Ordering::SeqCst);
            drop(sender);
            self.available.notify_waiters();
            tracing::info!("Job queue closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Administrative override of a ledger entry, inserting it if absent.
    pub fn update_status(&self, id: JobId, status: JobStatus) {
        self.ledger.upsert(id, status);
    }

    /// Copy of the current ledger.
    pub fn statuses(&self) -> HashMap<JobId, JobStatus> {
        self.ledger.snapshot()
    }

    pub fn counts(&self) -> StatusCounts {
        self.ledger.counts()
    }

    pub fn ledger(&self) -> &StatusLedger {
        &self.ledger
    }

    /// Number of jobs waiting in the channel.
    pub fn pending(&self) -> usize {
        self.buffered.load(Ordering::SeqCst)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
