//! # Fair Scheduler
//!
//! A simulated CPU scheduler that shares time in proportion to
//! niceness-derived weights, in the style of a completely fair scheduler.
//!
//! ## Philosophy
//!
//! - **One owner per record**: a [`Process`] is moved into the scheduler
//!   and lives in exactly one place, the registry or the stopped archive.
//! - **One lock**: every collection that must change together lives in
//!   one [`SchedulerState`] behind one mutex.
//! - **Determinism first**: the state machine takes time as an argument,
//!   so it can be driven tick by tick in tests. Only [`Scheduler`] owns
//!   threads and a clock.
//!
//! ## Design
//!
//! - **Run queue**: ordered by `(vruntime, id)`; the head runs next.
//! - **Weights**: nice 0 has weight 1024, each nice step about 10% less.
//! - **Time slice**: the process's share of the aggregate weight times the
//!   scheduling latency, floored at a minimum slice.
//! - **Virtual runtime**: real running time scaled by `1024 / weight`.
//!
//! ## Example
//!
//! ```no_run
//! use core_types::{Nice, ProcessId};
//! use fair_scheduler::{Process, Scheduler, SchedulerConfig};
//! use std::time::Duration;
//!
//! let scheduler = Scheduler::new(SchedulerConfig::default()).unwrap();
//! scheduler.schedule(Process::new(ProcessId::new(1))).unwrap();
//! scheduler
//!     .schedule(Process::new(ProcessId::new(2)).with_nice(Nice::new(5).unwrap()))
//!     .unwrap();
//! scheduler.block(ProcessId::new(2), Duration::from_millis(100)).unwrap();
//! println!("{:?}", scheduler.processes());
//! scheduler.shutdown();
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod process;
pub mod run_queue;
pub mod scheduler;
pub mod signal;
pub mod state;
pub mod weights;

pub use clock::{Clock, MonotonicClock, SimClock};
pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use events::{EventLog, ScheduleEvent};
pub use process::{Process, ProcessSnapshot};
pub use run_queue::RunQueue;
pub use scheduler::Scheduler;
pub use state::{BlockToken, SchedulerState, TickOutcome};
