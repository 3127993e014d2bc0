use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RelayError, Result};

/// Opaque identity of a job within one queue lifetime.
///
/// The queue never generates ids; callers are responsible for keeping them
/// unique per batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id derived from an item name and its modification time, e.g.
    /// `clip.mp4-2024-05-01T10:00:00Z`.
    pub fn for_item(name: &str, modified_at: DateTime<Utc>) -> Self {
        Self(format!(
            "{}-{}",
            name,
            modified_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ))
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Done,
    Failed,
}

impl JobStatus {
    /// `Done` and `Failed` end a job's lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "done" => Ok(JobStatus::Done),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(RelayError::InvalidStatus(s.to_string())),
        }
    }
}

/// Identity and initial status shared by concrete job types.
///
/// The status stored here is only the value a job was built with. The queue
/// reads and writes status exclusively through the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobBase {
    pub id: JobId,
    pub status: JobStatus,
}

impl JobBase {
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
        }
    }
}

/// A unit of work pulled off the queue by a worker.
#[async_trait]
pub trait Job: Send + Sync {
    fn id(&self) -> &JobId;

    /// Run the job once. An error marks the job `Failed`; it is never retried.
    async fn execute(&self) -> Result<()>;
}
