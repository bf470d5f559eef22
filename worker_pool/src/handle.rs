//! Awaitable task handles

use crate::PoolError;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Handle to a submitted task's eventual result
///
/// Dropping the handle detaches the task; it still runs.
#[derive(Debug)]
pub struct TaskHandle<T> {
    receiver: Receiver<T>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(receiver: Receiver<T>) -> Self {
        Self { receiver }
    }

    /// Blocks until the task completes
    ///
    /// Returns [`PoolError::TaskDropped`] if the task was discarded at
    /// shutdown or panicked.
    pub fn wait(self) -> Result<T, PoolError> {
        self.receiver.recv().map_err(|_| PoolError::TaskDropped)
    }

    /// Blocks for at most `timeout`
    ///
    /// Returns `Ok(None)` if the task is still pending; the handle remains
    /// usable.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Option<T>, PoolError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(value) => Ok(Some(value)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(PoolError::TaskDropped),
        }
    }
}
