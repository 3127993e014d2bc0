use thiserror::Error;

use crate::delivery::DeliveryError;
use crate::discovery::DiscoveryError;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Job queue is closed")]
    QueueClosed,

    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Job panicked: {0}")]
    JobPanicked(String),

    #[error("Job task was cancelled")]
    JobCancelled,

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;
