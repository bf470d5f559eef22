//! Scheduling audit trail

use core_types::{Nice, ProcessId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Scheduling event, stamped with the clock time in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEvent {
    /// Process entered the run queue for the first time
    Admitted {
        id: ProcessId,
        vruntime_us: u64,
        time_slice_ms: u64,
        timestamp_ms: u64,
    },
    /// Run queue head was promoted to Running
    Dispatched { id: ProcessId, timestamp_ms: u64 },
    /// Running process exhausted its time slice
    Preempted {
        id: ProcessId,
        ran_ms: u64,
        vruntime_us: u64,
        timestamp_ms: u64,
    },
    /// Process left the run queue to wait
    Blocked { id: ProcessId, timestamp_ms: u64 },
    /// Blocked process re-entered the run queue
    Unblocked {
        id: ProcessId,
        vruntime_us: u64,
        timestamp_ms: u64,
    },
    /// Process moved to the stopped archive
    Stopped { id: ProcessId, timestamp_ms: u64 },
    /// Niceness changed
    PriorityChanged {
        id: ProcessId,
        old: Nice,
        new: Nice,
        timestamp_ms: u64,
    },
    /// Stopped records discarded by cleanup
    Reaped { count: usize, timestamp_ms: u64 },
}

impl fmt::Display for ScheduleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleEvent::Admitted {
                id,
                vruntime_us,
                time_slice_ms,
                timestamp_ms,
            } => write!(
                f,
                "[{}ms] admitted {} vruntime={}us slice={}ms",
                timestamp_ms, id, vruntime_us, time_slice_ms
            ),
            ScheduleEvent::Dispatched { id, timestamp_ms } => {
                write!(f, "[{}ms] dispatched {}", timestamp_ms, id)
            }
            ScheduleEvent::Preempted {
                id,
                ran_ms,
                vruntime_us,
                timestamp_ms,
            } => write!(
                f,
                "[{}ms] preempted {} after {}ms vruntime={}us",
                timestamp_ms, id, ran_ms, vruntime_us
            ),
            ScheduleEvent::Blocked { id, timestamp_ms } => {
                write!(f, "[{}ms] blocked {}", timestamp_ms, id)
            }
            ScheduleEvent::Unblocked {
                id,
                vruntime_us,
                timestamp_ms,
            } => write!(
                f,
                "[{}ms] unblocked {} vruntime={}us",
                timestamp_ms, id, vruntime_us
            ),
            ScheduleEvent::Stopped { id, timestamp_ms } => {
                write!(f, "[{}ms] stopped {}", timestamp_ms, id)
            }
            ScheduleEvent::PriorityChanged {
                id,
                old,
                new,
                timestamp_ms,
            } => write!(
                f,
                "[{}ms] nice {} {} -> {}",
                timestamp_ms, id, old, new
            ),
            ScheduleEvent::Reaped {
                count,
                timestamp_ms,
            } => write!(f, "[{}ms] reaped {} stopped", timestamp_ms, count),
        }
    }
}

/// Bounded ring of recent events; the oldest is evicted first
#[derive(Debug)]
pub struct EventLog {
    events: VecDeque<ScheduleEvent>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn push(&mut self, event: ScheduleEvent) {
        if self.capacity == 0 {
            return;
        }
        while self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn to_vec(&self) -> Vec<ScheduleEvent> {
        self.events.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatched(raw: i32) -> ScheduleEvent {
        ScheduleEvent::Dispatched {
            id: ProcessId::new(raw),
            timestamp_ms: raw as u64,
        }
    }

    #[test]
    fn test_ring_evicts_oldest() {
        let mut log = EventLog::new(2);
        log.push(dispatched(1));
        log.push(dispatched(2));
        log.push(dispatched(3));
        assert_eq!(log.to_vec(), vec![dispatched(2), dispatched(3)]);
    }

    #[test]
    fn test_zero_capacity_records_nothing() {
        let mut log = EventLog::new(0);
        log.push(dispatched(1));
        assert!(log.is_empty());
    }

    #[test]
    fn test_event_display() {
        assert_eq!(dispatched(5).to_string(), "[5ms] dispatched pid:5");
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&dispatched(1)).unwrap();
        assert!(json.contains("Dispatched"));
        let back: ScheduleEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dispatched(1));
    }
}
