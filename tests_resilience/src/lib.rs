//! Resilience Test Utilities
//!
//! This crate provides shared utilities for resilience and integration tests.
//!
//! ## Test Philosophy
//!
//! - **Safety under contention**: Invariants hold while many callers race the dispatch loop
//! - **Exactly-once completion**: A blocked process is re-admitted once, whoever wins
//! - **Deterministic replay**: Operation sequences come from a seeded `StdRng`
//! - **Bounded teardown**: Shutdown never waits out pending simulated I/O

use core_types::ProcessId;
use fair_scheduler::{Scheduler, SchedulerConfig, SchedulerError, SimClock};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Configuration with fast background loops and a large event ring
pub fn stress_config() -> SchedulerConfig {
    SchedulerConfig {
        cleanup_interval: Duration::from_millis(5),
        event_log_capacity: 100_000,
        ..SchedulerConfig::default()
    }
}

/// Creates a scheduler driven by a manually advanced clock
pub fn sim_scheduler(config: SchedulerConfig) -> Result<(Scheduler, SimClock), SchedulerError> {
    let clock = SimClock::new();
    let scheduler = Scheduler::with_clock(config, Arc::new(clock.clone()))?;
    Ok((scheduler, clock))
}

pub fn pid(raw: i32) -> ProcessId {
    ProcessId::new(raw)
}

/// Polls `condition` until it holds or `timeout` passes
pub fn wait_for<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_for_times_out() {
        assert!(!wait_for(Duration::from_millis(5), || false));
        assert!(wait_for(Duration::from_millis(5), || true));
    }
}
