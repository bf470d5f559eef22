//! # Scheduler Runtime
//!
//! Threads and locking around [`SchedulerState`].
//!
//! ## Threads of control
//!
//! - **Dispatch loop**: one tick every `tick_interval`; the only place a
//!   process becomes Running or is preempted.
//! - **Cleanup loop**: trims the stopped archive every `cleanup_interval`.
//! - **Worker pool**: simulates I/O completion for blocked processes.
//! - **Callers**: any thread may call the public operations.
//!
//! Every operation takes the one state mutex for its full duration and
//! releases it before any wait. Time is read under the lock, so
//! operations observe the clock in lock order.
//!
//! ## Teardown
//!
//! Dispatch stops first, then every tracked process is stopped, then
//! pending unblock tasks are cancelled and the pool joined, and finally
//! the cleanup loop stops. Each unblock task holds an `Arc` of the shared
//! state and waits on a cancellation signal, so no task can outlive the
//! state it touches.

use crate::clock::{Clock, MonotonicClock};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::events::ScheduleEvent;
use crate::process::{Process, ProcessSnapshot};
use crate::signal::{BackgroundLoop, ShutdownSignal};
use crate::state::{BlockToken, SchedulerState};
use core_types::{ProcessId, ProcessInfo};
use log::{debug, error, info};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use worker_pool::WorkerPool;

/// State reachable from background threads and worker tasks
struct Shared {
    state: Mutex<SchedulerState>,
    clock: Arc<dyn Clock>,
    io_cancel: ShutdownSignal,
}

impl Shared {
    fn tick(&self) {
        let mut state = self.state.lock();
        let now = self.clock.now();
        if let Err(err) = state.tick(now) {
            error!("dispatch tick failed: {}", err);
        }
    }

    fn cleanup(&self) {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.cleanup(now);
    }

    fn unblock(&self, id: ProcessId) -> Result<(), SchedulerError> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.unblock(id, now)
    }

    fn complete_block(&self, id: ProcessId, token: BlockToken) -> Result<(), SchedulerError> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        state.complete_block(id, token, now)
    }
}

/// Completely fair process scheduler
///
/// Owns the dispatch and cleanup threads and the worker pool. Dropping
/// the scheduler (or calling [`Scheduler::shutdown`]) tears them down.
pub struct Scheduler {
    shared: Arc<Shared>,
    pool: WorkerPool,
    dispatch: Option<BackgroundLoop>,
    cleanup: Option<BackgroundLoop>,
}

impl Scheduler {
    /// Creates a scheduler on wall-clock time
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        Self::with_clock(config, Arc::new(MonotonicClock::new()))
    }

    /// Creates a scheduler reading time from `clock`
    pub fn with_clock(
        config: SchedulerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SchedulerError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(SchedulerState::new(&config)),
            clock,
            io_cancel: ShutdownSignal::new(),
        });
        let pool = WorkerPool::new(config.worker_threads);

        let dispatch = {
            let shared = Arc::clone(&shared);
            BackgroundLoop::spawn("sched-dispatch", config.tick_interval, move || shared.tick())
                .map_err(|_| SchedulerError::ThreadSpawn("dispatch".to_string()))?
        };
        let cleanup = {
            let shared = Arc::clone(&shared);
            BackgroundLoop::spawn("sched-cleanup", config.cleanup_interval, move || {
                shared.cleanup()
            })
            .map_err(|_| SchedulerError::ThreadSpawn("cleanup".to_string()))?
        };

        info!(
            "scheduler started: tick={:?} latency={:?} workers={}",
            config.tick_interval,
            config.sched_latency,
            pool.threads()
        );
        Ok(Self {
            shared,
            pool,
            dispatch: Some(dispatch),
            cleanup: Some(cleanup),
        })
    }

    /// Admits a new process
    pub fn schedule(&self, process: Process) -> Result<(), SchedulerError> {
        let mut state = self.shared.state.lock();
        let now = self.shared.clock.now();
        state.admit(process, now)
    }

    /// Changes a process's niceness
    pub fn increase_priority(&self, id: ProcessId, nice: i32) -> Result<(), SchedulerError> {
        let mut state = self.shared.state.lock();
        let now = self.shared.clock.now();
        state.set_nice(id, nice, now)
    }

    /// Stops a process and moves it to the stopped archive
    pub fn stop(&self, id: ProcessId) -> Result<(), SchedulerError> {
        let mut state = self.shared.state.lock();
        let now = self.shared.clock.now();
        state.stop(id, now)
    }

    /// Blocks a process on simulated I/O lasting `duration`
    ///
    /// A worker unblocks it once `duration` has passed, unless it was
    /// unblocked or stopped in the meantime. A completion left over from
    /// an earlier block never ends a later one.
    pub fn block(&self, id: ProcessId, duration: Duration) -> Result<(), SchedulerError> {
        let mut state = self.shared.state.lock();
        let token = state.ensure_blockable(id)?;

        let shared = Arc::clone(&self.shared);
        self.pool
            .submit(move || complete_io(&shared, id, token, duration))?;

        let now = self.shared.clock.now();
        let recorded = state.block(id, now)?;
        if recorded != token {
            return Err(SchedulerError::InternalConsistency(format!(
                "{} blocked under an unexpected token",
                id
            )));
        }
        Ok(())
    }

    /// Re-admits a blocked process
    pub fn unblock(&self, id: ProcessId) -> Result<(), SchedulerError> {
        self.shared.unblock(id)
    }

    /// Returns (id, state) for every tracked process
    pub fn processes(&self) -> Vec<ProcessInfo> {
        self.shared.state.lock().processes()
    }

    /// Returns detailed views of every tracked process
    pub fn snapshot(&self) -> Vec<ProcessSnapshot> {
        self.shared.state.lock().snapshot()
    }

    /// Returns a detailed view of a tracked or archived process
    pub fn process(&self, id: ProcessId) -> Option<ProcessSnapshot> {
        let state = self.shared.state.lock();
        state
            .process(id)
            .or_else(|| state.archived_process(id))
            .map(Process::snapshot)
    }

    /// Returns (id, state) for the stopped archive, oldest first
    pub fn archived(&self) -> Vec<ProcessInfo> {
        self.shared.state.lock().archived()
    }

    /// Returns the currently running process
    pub fn current(&self) -> Option<ProcessId> {
        self.shared.state.lock().current()
    }

    pub fn aggregate_weight(&self) -> u64 {
        self.shared.state.lock().aggregate_weight()
    }

    /// Returns the recent scheduling events
    pub fn events(&self) -> Vec<ScheduleEvent> {
        self.shared.state.lock().events()
    }

    /// Checks every structural invariant under the lock
    pub fn verify_invariants(&self) -> Result<(), SchedulerError> {
        self.shared.state.lock().verify_invariants()
    }

    /// Tears down background work and stops every process
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let Some(mut dispatch) = self.dispatch.take() else {
            return;
        };
        dispatch.stop();

        {
            let mut state = self.shared.state.lock();
            let now = self.shared.clock.now();
            let stopped = state.stop_all(now);
            if !stopped.is_empty() {
                info!("stopped {} processes at shutdown", stopped.len());
            }
        }

        self.shared.io_cancel.trigger();
        self.pool.shutdown();

        if let Some(mut cleanup) = self.cleanup.take() {
            cleanup.stop();
        }
        info!("scheduler shut down");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Worker task: waits out the I/O, then re-admits the process
fn complete_io(shared: &Shared, id: ProcessId, token: BlockToken, duration: Duration) -> bool {
    if shared.io_cancel.wait_timeout(duration) {
        debug!("i/o for {} cancelled", id);
        return false;
    }
    info!("i/o completed for {}", id);
    match shared.complete_block(id, token) {
        Ok(()) => true,
        Err(err) => {
            debug!("i/o completion for {} ignored: {}", id, err);
            false
        }
    }
}
