//! Shared test doubles for queue, worker, and dispatch tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::Notify;

use reelpost::delivery::{Deliver, DeliveryError};
use reelpost::discovery::{MediaInfo, MediaItem};
use reelpost::scheduler::{Job, JobId, JobQueue, JobStatus};
use reelpost::{RelayError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    Fail,
    Panic,
}

/// A job whose result is fixed up front and that counts its executions.
///
/// With [`ScriptedJob::gated`] the job signals `started` once it begins and
/// then waits for `release` before finishing.
pub struct ScriptedJob {
    id: JobId,
    outcome: Outcome,
    pub calls: Arc<AtomicUsize>,
    gate: Option<Gate>,
}

#[derive(Clone, Default)]
pub struct Gate {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl ScriptedJob {
    pub fn new(id: &str, outcome: Outcome) -> Self {
        Self {
            id: JobId::new(id),
            outcome,
            calls: Arc::new(AtomicUsize::new(0)),
            gate: None,
        }
    }

    pub fn succeeding(id: &str) -> Self {
        Self::new(id, Outcome::Succeed)
    }

    pub fn failing(id: &str) -> Self {
        Self::new(id, Outcome::Fail)
    }

    pub fn gated(id: &str, outcome: Outcome, gate: Gate) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(id, outcome)
        }
    }

    pub fn call_count(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl Job for ScriptedJob {
    fn id(&self) -> &JobId {
        &self.id
    }

    async fn execute(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        match self.outcome {
            Outcome::Succeed => Ok(()),
            Outcome::Fail => Err(RelayError::Delivery(DeliveryError::Rejected(
                "error occurred".to_string(),
            ))),
            Outcome::Panic => panic!("scripted panic in {}", self.id),
        }
    }
}

/// Records every delivery and answers from a per-item script.
#[derive(Default)]
pub struct RecordingDelivery {
    pub sent: Mutex<Vec<(String, u32)>>,
    failures: Mutex<Vec<(String, DeliveryError)>>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make delivery of `name` fail with `error`.
    pub fn fail_on(self, name: &str, error: DeliveryError) -> Self {
        self.failures.lock().push((name.to_string(), error));
        self
    }

    pub fn sent(&self) -> Vec<(String, u32)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Deliver for RecordingDelivery {
    async fn deliver(
        &self,
        item: &MediaItem,
        stars: u32,
    ) -> std::result::Result<(), DeliveryError> {
        self.sent.lock().push((item.name.clone(), stars));
        let failure = self
            .failures
            .lock()
            .iter()
            .find(|(name, _)| *name == item.name)
            .map(|(_, e)| e.clone());
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

pub fn media_item(name: &str, hour: u32) -> MediaItem {
    MediaItem::new(name, format!("var/files/{name}"), at(hour)).with_info(MediaInfo {
        width: 1280,
        height: 720,
        duration_secs: 30,
    })
}

/// Poll until `id` reaches `status` or `timeout` elapses.
pub async fn wait_for_status(
    queue: &JobQueue,
    id: &str,
    status: JobStatus,
    timeout: Duration,
) -> bool {
    let id = JobId::new(id);
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if queue.ledger().get(&id) == Some(status) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

/// Poll until every ledger entry is terminal and there are `expected` of them.
pub async fn wait_for_terminal(queue: &JobQueue, expected: usize, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        let statuses = queue.statuses();
        if statuses.len() == expected && statuses.values().all(|s| s.is_terminal()) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
