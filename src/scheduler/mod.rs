pub mod dispatcher;
pub mod job;
pub mod ledger;
pub mod queue;

pub use dispatcher::{BatchReport, Dispatcher};
pub use job::{Job, JobBase, JobId, JobStatus};
pub use ledger::{StatusCounts, StatusLedger};
pub use queue::{BoxedJob, JobQueue};
