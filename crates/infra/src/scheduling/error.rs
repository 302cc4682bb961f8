//! Scheduler error types

use std::time::Duration;

use thiserror::Error;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler is already running
    #[error("scheduler already running")]
    AlreadyRunning,

    /// Scheduler is not running
    #[error("scheduler not running")]
    NotRunning,

    /// Graceful shutdown did not finish in time
    #[error("scheduler shutdown timed out after {timeout:?}")]
    ShutdownTimeout { timeout: Duration },

    /// Background task join failed
    #[error("scheduler task join failed: {0}")]
    JoinFailed(String),
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
