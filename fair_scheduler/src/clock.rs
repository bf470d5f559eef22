//! # Clocks
//!
//! Time sources for the scheduler.
//!
//! The scheduler never reads the system time directly. It asks a [`Clock`]
//! for "now", so the same dispatch code runs against wall time in
//! production and against a manually advanced clock in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source
///
/// `now()` is measured from an arbitrary, fixed origin and never goes
/// backwards.
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall-clock time measured from the clock's creation
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Simulated clock with controllable time progression
///
/// Only advances when told to. Clones share the same time, so a test can
/// keep one handle while the scheduler owns another.
///
/// # Examples
///
/// ```
/// use fair_scheduler::clock::{Clock, SimClock};
/// use std::time::Duration;
///
/// let clock = SimClock::new();
/// let view = clock.clone();
/// clock.advance(Duration::from_millis(100));
/// assert_eq!(view.now(), Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    nanos: Arc<AtomicU64>,
}

impl SimClock {
    /// Creates a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by `delta`
    ///
    /// # Panics
    ///
    /// Panics if the clock would overflow (after roughly 584 years).
    pub fn advance(&self, delta: Duration) {
        let delta = u64::try_from(delta.as_nanos()).expect("Clock overflow");
        let previous = self.nanos.fetch_add(delta, Ordering::SeqCst);
        assert!(previous.checked_add(delta).is_some(), "Clock overflow");
    }

    /// Advances the clock by whole milliseconds
    pub fn advance_ms(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Sets the clock to an absolute time
    ///
    /// # Panics
    ///
    /// Panics if `time` is earlier than the current time.
    pub fn set(&self, time: Duration) {
        let target = u64::try_from(time.as_nanos()).expect("Clock overflow");
        let current = self.nanos.load(Ordering::SeqCst);
        assert!(
            target >= current,
            "Cannot set clock backwards: {:?} < {:?}",
            time,
            Duration::from_nanos(current)
        );
        self.nanos.store(target, Ordering::SeqCst);
    }
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}
