//! Scheduler errors

use core_types::{InvalidNice, ProcessId};
use thiserror::Error;
use worker_pool::PoolError;

/// Failure of a scheduler operation
///
/// A failed operation leaves the scheduler state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("Process not found: {0}")]
    NotFound(ProcessId),

    #[error("Process already scheduled: {0}")]
    DuplicateAdmission(ProcessId),

    #[error("Process already blocked: {0}")]
    AlreadyBlocked(ProcessId),

    #[error("Process not blocked: {0}")]
    NotBlocked(ProcessId),

    #[error("Invalid nice value {0}: expected -20 to 19")]
    InvalidPriority(i32),

    #[error("Worker pool has been shut down")]
    PoolShutDown,

    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),

    #[error("Failed to spawn {0} thread")]
    ThreadSpawn(String),
}

impl From<InvalidNice> for SchedulerError {
    fn from(err: InvalidNice) -> Self {
        SchedulerError::InvalidPriority(err.0)
    }
}

impl From<PoolError> for SchedulerError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::ShutDown => SchedulerError::PoolShutDown,
            PoolError::TaskDropped => {
                SchedulerError::InternalConsistency("worker task dropped".to_string())
            }
        }
    }
}
