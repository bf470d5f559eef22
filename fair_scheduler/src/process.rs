//! Process records

use core_types::{Nice, Priority, ProcessId, ProcessInfo, ProcessState};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Mutable state of one simulated process
///
/// Created by the caller and handed to the scheduler by value. From then
/// on the scheduler's registry (later the stopped archive) is its only
/// owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub(crate) id: ProcessId,
    pub(crate) vruntime: Duration,
    pub(crate) time_slice: Duration,
    pub(crate) last_dispatch: Duration,
    pub(crate) state: ProcessState,
    pub(crate) nice: Nice,
    /// Real time spent Running
    pub(crate) total_runtime: Duration,
    pub(crate) dispatch_count: u64,
}

impl Process {
    /// Creates a nice-0 process in the `Init` state
    pub fn new(id: ProcessId) -> Self {
        Self {
            id,
            vruntime: Duration::ZERO,
            time_slice: Duration::ZERO,
            last_dispatch: Duration::ZERO,
            state: ProcessState::Init,
            nice: Nice::DEFAULT,
            total_runtime: Duration::ZERO,
            dispatch_count: 0,
        }
    }

    /// Sets the initial niceness
    pub fn with_nice(mut self, nice: Nice) -> Self {
        self.nice = nice;
        self
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn nice(&self) -> Nice {
        self.nice
    }

    pub fn priority(&self) -> Priority {
        self.nice.priority()
    }

    pub fn vruntime(&self) -> Duration {
        self.vruntime
    }

    pub fn time_slice(&self) -> Duration {
        self.time_slice
    }

    /// Time of the most recent transition into `Running`
    pub fn last_dispatch(&self) -> Duration {
        self.last_dispatch
    }

    pub fn total_runtime(&self) -> Duration {
        self.total_runtime
    }

    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count
    }

    pub fn info(&self) -> ProcessInfo {
        ProcessInfo::new(self.id, self.state)
    }

    pub fn snapshot(&self) -> ProcessSnapshot {
        ProcessSnapshot {
            id: self.id,
            state: self.state,
            nice: self.nice,
            vruntime_us: micros(self.vruntime),
            time_slice_ms: millis(self.time_slice),
            total_runtime_ms: millis(self.total_runtime),
            dispatch_count: self.dispatch_count,
        }
    }

    /// Accounts the running time since the last dispatch
    ///
    /// Returns the elapsed time. Only meaningful while `Running`.
    pub(crate) fn account_run(&mut self, now: Duration) -> Duration {
        let elapsed = now.saturating_sub(self.last_dispatch);
        self.total_runtime += elapsed;
        elapsed
    }
}

/// Detailed, serializable view of one process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub id: ProcessId,
    pub state: ProcessState,
    pub nice: Nice,
    pub vruntime_us: u64,
    pub time_slice_ms: u64,
    pub total_runtime_ms: u64,
    pub dispatch_count: u64,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_process_defaults() {
        let process = Process::new(ProcessId::new(1));
        assert_eq!(process.state(), ProcessState::Init);
        assert_eq!(process.nice(), Nice::DEFAULT);
        assert_eq!(process.priority().get(), 20);
        assert_eq!(process.vruntime(), Duration::ZERO);
        assert_eq!(process.dispatch_count(), 0);
    }

    #[test]
    fn test_with_nice_sets_priority() {
        let process = Process::new(ProcessId::new(1)).with_nice(Nice::new(-5).unwrap());
        assert_eq!(process.priority().get(), 15);
    }

    #[test]
    fn test_account_run_accumulates() {
        let mut process = Process::new(ProcessId::new(1));
        process.last_dispatch = Duration::from_millis(10);
        let elapsed = process.account_run(Duration::from_millis(25));
        assert_eq!(elapsed, Duration::from_millis(15));
        process.last_dispatch = Duration::from_millis(40);
        process.account_run(Duration::from_millis(45));
        assert_eq!(process.total_runtime(), Duration::from_millis(20));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut process = Process::new(ProcessId::new(9)).with_nice(Nice::MAX);
        process.vruntime = Duration::from_micros(1500);
        process.time_slice = Duration::from_millis(6);
        let snapshot = process.snapshot();
        assert_eq!(snapshot.vruntime_us, 1500);
        assert_eq!(snapshot.time_slice_ms, 6);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["nice"], 19);
        assert_eq!(json["state"], "Init");
    }
}
