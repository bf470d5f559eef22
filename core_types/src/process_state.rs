//! Process lifecycle states

use crate::ProcessId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a simulated process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessState {
    /// Created by the caller, not yet admitted
    Init,
    /// Waiting in the run queue
    Runnable,
    /// Currently dispatched (at most one process at a time)
    Running,
    /// Waiting for a simulated external event
    Blocked,
    /// Terminated, held in the stopped archive
    Stopped,
    /// Exited and reaped; reserved, never entered
    Zombie,
}

impl ProcessState {
    /// Returns true for the states that keep a process in the run queue
    pub fn is_queued(&self) -> bool {
        matches!(self, ProcessState::Runnable | ProcessState::Running)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Init => write!(f, "init"),
            ProcessState::Runnable => write!(f, "runnable"),
            ProcessState::Running => write!(f, "running"),
            ProcessState::Blocked => write!(f, "blocked"),
            ProcessState::Stopped => write!(f, "stopped"),
            ProcessState::Zombie => write!(f, "zombie"),
        }
    }
}

/// An (id, state) pair as reported by process listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub id: ProcessId,
    pub state: ProcessState,
}

impl ProcessInfo {
    pub fn new(id: ProcessId, state: ProcessState) -> Self {
        Self { id, state }
    }
}
