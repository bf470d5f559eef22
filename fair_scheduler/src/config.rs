//! Scheduler configuration

use std::time::Duration;

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Period of the dispatch loop
    pub tick_interval: Duration,
    /// Period of the stopped-archive cleanup loop
    pub cleanup_interval: Duration,
    /// Scheduling period shared out among admitted processes
    pub sched_latency: Duration,
    /// Floor for any computed time slice
    pub min_time_slice: Duration,
    /// Workers used to simulate asynchronous completion
    ///
    /// Each pending block holds a worker for its whole duration. With more
    /// blocks pending than workers, later completions wait for a free
    /// worker and arrive late.
    pub worker_threads: usize,
    /// Stopped records kept after a cleanup pass
    pub archive_retention: usize,
    /// Capacity of the audit event ring (0 disables it)
    pub event_log_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1),
            cleanup_interval: Duration::from_millis(500),
            sched_latency: Duration::from_millis(48),
            min_time_slice: Duration::from_millis(6),
            worker_threads: 4,
            archive_retention: 1,
            event_log_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.tick_interval, Duration::from_millis(1));
        assert_eq!(config.cleanup_interval, Duration::from_millis(500));
        assert_eq!(config.sched_latency, Duration::from_millis(48));
        assert_eq!(config.min_time_slice, Duration::from_millis(6));
        assert_eq!(config.worker_threads, 4);
        assert_eq!(config.archive_retention, 1);
    }
}
