use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;

use crate::scheduler::job::{JobId, JobStatus};

/// Per-status tally of the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub queued: usize,
    pub processing: usize,
    pub done: usize,
    pub failed: usize,
}

/// Current status of every job, keyed by identity.
///
/// All access goes through a single mutex that is only held for the duration
/// of a map operation.
#[derive(Debug, Default)]
pub struct StatusLedger {
    entries: Mutex<HashMap<JobId, JobStatus>>,
}

impl StatusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status for `id`, inserting it if absent.
    pub fn upsert(&self, id: JobId, status: JobStatus) {
        self.entries.lock().insert(id, status);
    }

    /// Point-in-time copy of the ledger.
    pub fn snapshot(&self) -> HashMap<JobId, JobStatus> {
        self.entries.lock().clone()
    }

    pub fn reset(&self) {
        self.entries.lock().clear();
    }

    /// Set the status for `id` and run `f` before the lock is released.
    pub(crate) fn upsert_with<R>(&self, id: JobId, status: JobStatus, f: impl FnOnce() -> R) -> R {
        let mut entries = self.entries.lock();
        entries.insert(id, status);
        f()
    }

    /// Remove every entry and run `f` before the lock is released.
    pub(crate) fn reset_with<R>(&self, f: impl FnOnce() -> R) -> R {
        let mut entries = self.entries.lock();
        entries.clear();
        f()
    }

    pub fn get(&self, id: &JobId) -> Option<JobStatus> {
        self.entries.lock().get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn counts(&self) -> StatusCounts {
        let entries = self.entries.lock();
        let mut counts = StatusCounts {
            total: entries.len(),
            ..StatusCounts::default()
        };
        for status in entries.values() {
            match status {
                JobStatus::Queued => counts.queued += 1,
                JobStatus::Processing => counts.processing += 1,
                JobStatus::Done => counts.done += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}
