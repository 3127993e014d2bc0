pub mod config;
pub mod dashboard;
pub mod delivery;
pub mod discovery;
pub mod error;
pub mod node;
pub mod scheduler;
pub mod shutdown;
pub mod worker;

pub use error::{RelayError, Result};
