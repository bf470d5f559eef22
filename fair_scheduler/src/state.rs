//! # Scheduler State
//!
//! Every piece of mutable scheduler state in one owned structure.
//!
//! The run queue, registry, stopped archive, blocked set and aggregate
//! weight are fields of [`SchedulerState`], so "updated together" is a
//! property of the type rather than a locking convention. The runtime
//! wraps it in a single mutex; tests drive it directly.
//!
//! ## Determinism
//!
//! Nothing here reads a clock. Operations that depend on time take `now`
//! as an argument, so the same calls with the same times always produce
//! the same schedule.
//!
//! ## Invariants
//!
//! - A process is in the run queue iff its state is Runnable or Running,
//!   and it is queued under `(record.vruntime, id)`.
//! - At most one process is Running, and it is `current`.
//! - The blocked set holds exactly the Blocked registry entries, each
//!   under the token of the block that put it there.
//! - The aggregate weight is the sum of the registry's weights.
//!
//! [`SchedulerState::verify_invariants`] checks all of them.

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::events::{EventLog, ScheduleEvent};
use crate::process::{Process, ProcessSnapshot};
use crate::run_queue::RunQueue;
use crate::weights;
use core_types::{Nice, ProcessId, ProcessInfo, ProcessState};
use log::{debug, info, warn};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

/// What a dispatch tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Run queue was empty
    Idle,
    /// Run queue head was promoted to Running
    Dispatched(ProcessId),
    /// Running process keeps the CPU; its slice is not used up
    Continued(ProcessId),
    /// Running process exhausted its slice and was requeued
    Preempted(ProcessId),
}

/// Identifies one `block` call
///
/// A pending I/O completion only re-admits the process if the process is
/// still blocked under the same token. Tokens are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockToken(u64);

/// Shared scheduler state
#[derive(Debug)]
pub struct SchedulerState {
    sched_latency: Duration,
    min_time_slice: Duration,
    archive_retention: usize,
    run_queue: RunQueue,
    registry: BTreeMap<ProcessId, Process>,
    archive: VecDeque<Process>,
    blocked: BTreeMap<ProcessId, BlockToken>,
    next_block: u64,
    aggregate_weight: u64,
    current: Option<ProcessId>,
    events: EventLog,
}

impl SchedulerState {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            sched_latency: config.sched_latency,
            min_time_slice: config.min_time_slice,
            archive_retention: config.archive_retention,
            run_queue: RunQueue::new(),
            registry: BTreeMap::new(),
            archive: VecDeque::new(),
            blocked: BTreeMap::new(),
            next_block: 0,
            aggregate_weight: 0,
            current: None,
            events: EventLog::new(config.event_log_capacity),
        }
    }

    /// Admits a new process (Schedule)
    ///
    /// The process becomes Runnable with a time slice derived from its
    /// share of the aggregate weight. If other processes are tracked it
    /// starts at the run queue's minimum virtual runtime, so it neither
    /// jumps ahead of nor falls behind the processes already waiting.
    pub fn admit(&mut self, mut process: Process, now: Duration) -> Result<(), SchedulerError> {
        let id = process.id;
        if self.registry.contains_key(&id) || self.run_queue.contains(id) {
            return Err(SchedulerError::DuplicateAdmission(id));
        }

        let weight = weights::weight(process.priority());
        let aggregate = self.aggregate_weight + weight;

        process.state = ProcessState::Runnable;
        process.time_slice =
            weights::time_slice(weight, aggregate, self.sched_latency, self.min_time_slice);
        process.vruntime = self.entry_vruntime();

        if !self.run_queue.insert(id, process.vruntime) {
            return Err(SchedulerError::DuplicateAdmission(id));
        }
        self.aggregate_weight = aggregate;

        info!(
            "admitted {} nice={} slice={:?} vruntime={:?}",
            id, process.nice, process.time_slice, process.vruntime
        );
        self.events.push(ScheduleEvent::Admitted {
            id,
            vruntime_us: micros(process.vruntime),
            time_slice_ms: millis(process.time_slice),
            timestamp_ms: millis(now),
        });
        self.registry.insert(id, process);
        Ok(())
    }

    /// Runs one dispatch tick
    ///
    /// If a process is Running and its slice is used up it is preempted;
    /// the freed CPU goes to the new head on the next tick. If nothing is
    /// Running, the run queue head is promoted.
    pub fn tick(&mut self, now: Duration) -> Result<TickOutcome, SchedulerError> {
        if let Some(id) = self.current {
            let process = self
                .registry
                .get_mut(&id)
                .filter(|p| p.state == ProcessState::Running)
                .ok_or_else(|| {
                    SchedulerError::InternalConsistency(format!("current {} is not running", id))
                })?;

            let elapsed = now.saturating_sub(process.last_dispatch);
            if elapsed < process.time_slice {
                return Ok(TickOutcome::Continued(id));
            }
            process.total_runtime += elapsed;
            self.preempt(id, elapsed, now)?;
            return Ok(TickOutcome::Preempted(id));
        }

        let Some((_, id)) = self.run_queue.head() else {
            return Ok(TickOutcome::Idle);
        };
        let process = self.registry.get_mut(&id).ok_or_else(|| {
            SchedulerError::InternalConsistency(format!("queued {} has no record", id))
        })?;
        if process.state != ProcessState::Runnable {
            return Err(SchedulerError::InternalConsistency(format!(
                "queued {} is {}",
                id, process.state
            )));
        }

        process.state = ProcessState::Running;
        process.last_dispatch = now;
        process.dispatch_count += 1;
        self.current = Some(id);

        debug!("running {}", id);
        self.events.push(ScheduleEvent::Dispatched {
            id,
            timestamp_ms: millis(now),
        });
        Ok(TickOutcome::Dispatched(id))
    }

    /// Requeues a process after it ran for `elapsed`
    ///
    /// The virtual runtime advances by `elapsed` normalized to nice-0
    /// weight, so lower-weight processes fall behind faster.
    fn preempt(
        &mut self,
        id: ProcessId,
        elapsed: Duration,
        now: Duration,
    ) -> Result<(), SchedulerError> {
        if self.current == Some(id) {
            self.current = None;
        }
        self.run_queue.remove(id).ok_or_else(|| {
            SchedulerError::InternalConsistency(format!("preempted {} was not queued", id))
        })?;
        let process = self.registry.get_mut(&id).ok_or_else(|| {
            SchedulerError::InternalConsistency(format!("preempted {} has no record", id))
        })?;

        process.state = ProcessState::Runnable;
        process.vruntime += weights::virtual_delta(elapsed, process.priority());

        if !self.run_queue.insert(id, process.vruntime) {
            return Err(SchedulerError::InternalConsistency(format!(
                "run queue key collision for {}",
                id
            )));
        }

        debug!(
            "preempted {} after {:?}, vruntime={:?}",
            id, elapsed, process.vruntime
        );
        self.events.push(ScheduleEvent::Preempted {
            id,
            ran_ms: millis(elapsed),
            vruntime_us: micros(process.vruntime),
            timestamp_ms: millis(now),
        });
        Ok(())
    }

    /// Changes a process's niceness (IncreasePriority)
    ///
    /// The aggregate weight is updated at once. The queued position is
    /// not: the new weight takes effect at the next preemption and the
    /// next time slice computation.
    pub fn set_nice(
        &mut self,
        id: ProcessId,
        nice: i32,
        now: Duration,
    ) -> Result<(), SchedulerError> {
        let nice = Nice::new(nice)?;
        let process = self
            .registry
            .get_mut(&id)
            .ok_or(SchedulerError::NotFound(id))?;

        let old = process.nice;
        self.aggregate_weight = self
            .aggregate_weight
            .saturating_sub(weights::weight(old.priority()))
            + weights::weight(nice.priority());
        process.nice = nice;

        info!("{} nice {} -> {}", id, old, nice);
        self.events.push(ScheduleEvent::PriorityChanged {
            id,
            old,
            new: nice,
            timestamp_ms: millis(now),
        });
        Ok(())
    }

    /// Checks that `block` would succeed, without changing anything
    ///
    /// Returns the token the next `block` call will record.
    pub fn ensure_blockable(&self, id: ProcessId) -> Result<BlockToken, SchedulerError> {
        if self.blocked.contains_key(&id) {
            return Err(SchedulerError::AlreadyBlocked(id));
        }
        let process = self.registry.get(&id).ok_or(SchedulerError::NotFound(id))?;
        if !process.state.is_queued() {
            return Err(SchedulerError::InternalConsistency(format!(
                "{} is {} but not recorded blocked",
                id, process.state
            )));
        }
        Ok(BlockToken(self.next_block))
    }

    /// Takes a process off the run queue until it is unblocked
    pub fn block(&mut self, id: ProcessId, now: Duration) -> Result<BlockToken, SchedulerError> {
        let token = self.ensure_blockable(id)?;
        let process = self
            .registry
            .get_mut(&id)
            .ok_or(SchedulerError::NotFound(id))?;

        if self.current == Some(id) {
            process.account_run(now);
            self.current = None;
        }
        self.run_queue.remove(id);
        process.state = ProcessState::Blocked;
        self.blocked.insert(id, token);
        self.next_block += 1;

        info!("blocked {}", id);
        self.events.push(ScheduleEvent::Blocked {
            id,
            timestamp_ms: millis(now),
        });
        Ok(token)
    }

    /// Re-admits a process whose I/O for `token` completed
    ///
    /// Fails with `NotBlocked` if the process was unblocked or stopped
    /// since, even when a later block is now pending.
    pub fn complete_block(
        &mut self,
        id: ProcessId,
        token: BlockToken,
        now: Duration,
    ) -> Result<(), SchedulerError> {
        if self.blocked.get(&id) != Some(&token) {
            return Err(SchedulerError::NotBlocked(id));
        }
        self.unblock(id, now)
    }

    /// Re-admits a blocked process
    ///
    /// Follows the admission rule: the process re-enters at the run
    /// queue's minimum virtual runtime. Its weight is still part of the
    /// aggregate, since it never left the registry.
    pub fn unblock(&mut self, id: ProcessId, now: Duration) -> Result<(), SchedulerError> {
        if !self.blocked.contains_key(&id) {
            return Err(SchedulerError::NotBlocked(id));
        }
        let vruntime = self.entry_vruntime();
        let process = self.registry.get_mut(&id).ok_or_else(|| {
            SchedulerError::InternalConsistency(format!("blocked {} has no record", id))
        })?;
        if self.run_queue.contains(id) {
            return Err(SchedulerError::InternalConsistency(format!(
                "blocked {} is queued",
                id
            )));
        }

        let weight = weights::weight(process.priority());
        process.state = ProcessState::Runnable;
        process.vruntime = vruntime;
        process.time_slice = weights::time_slice(
            weight,
            self.aggregate_weight,
            self.sched_latency,
            self.min_time_slice,
        );
        self.run_queue.insert(id, vruntime);
        self.blocked.remove(&id);

        info!("unblocked {} vruntime={:?}", id, vruntime);
        self.events.push(ScheduleEvent::Unblocked {
            id,
            vruntime_us: micros(vruntime),
            timestamp_ms: millis(now),
        });
        Ok(())
    }

    /// Moves a process from the registry to the stopped archive
    pub fn stop(&mut self, id: ProcessId, now: Duration) -> Result<(), SchedulerError> {
        let mut process = self
            .registry
            .remove(&id)
            .ok_or(SchedulerError::NotFound(id))?;

        if self.current == Some(id) {
            process.account_run(now);
            self.current = None;
        }
        self.run_queue.remove(id);
        self.blocked.remove(&id);
        self.aggregate_weight = self
            .aggregate_weight
            .saturating_sub(weights::weight(process.priority()));
        process.state = ProcessState::Stopped;
        self.archive.push_back(process);

        info!("stopped {}", id);
        self.events.push(ScheduleEvent::Stopped {
            id,
            timestamp_ms: millis(now),
        });
        Ok(())
    }

    /// Stops every tracked process, returning their ids
    pub fn stop_all(&mut self, now: Duration) -> Vec<ProcessId> {
        let ids: Vec<ProcessId> = self.registry.keys().copied().collect();
        for &id in &ids {
            if let Err(err) = self.stop(id, now) {
                warn!("failed to stop {} during teardown: {}", id, err);
            }
        }
        ids
    }

    /// Trims the stopped archive, oldest first
    ///
    /// Returns the number of records discarded.
    pub fn cleanup(&mut self, now: Duration) -> usize {
        let excess = self.archive.len().saturating_sub(self.archive_retention);
        if excess == 0 {
            return 0;
        }
        self.archive.drain(..excess);

        debug!("reaped {} stopped processes", excess);
        self.events.push(ScheduleEvent::Reaped {
            count: excess,
            timestamp_ms: millis(now),
        });
        excess
    }

    /// Returns (id, state) for every tracked process, ordered by id
    pub fn processes(&self) -> Vec<ProcessInfo> {
        self.registry.values().map(Process::info).collect()
    }

    /// Returns detailed views of every tracked process, ordered by id
    pub fn snapshot(&self) -> Vec<ProcessSnapshot> {
        self.registry.values().map(Process::snapshot).collect()
    }

    pub fn process(&self, id: ProcessId) -> Option<&Process> {
        self.registry.get(&id)
    }

    /// Returns (id, state) for the stopped archive, oldest first
    pub fn archived(&self) -> Vec<ProcessInfo> {
        self.archive.iter().map(Process::info).collect()
    }

    pub fn archived_process(&self, id: ProcessId) -> Option<&Process> {
        self.archive.iter().rev().find(|p| p.id == id)
    }

    pub fn current(&self) -> Option<ProcessId> {
        self.current
    }

    pub fn aggregate_weight(&self) -> u64 {
        self.aggregate_weight
    }

    pub fn run_queue(&self) -> &RunQueue {
        &self.run_queue
    }

    pub fn is_blocked(&self, id: ProcessId) -> bool {
        self.blocked.contains_key(&id)
    }

    pub fn events(&self) -> Vec<ScheduleEvent> {
        self.events.to_vec()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Checks every structural invariant
    pub fn verify_invariants(&self) -> Result<(), SchedulerError> {
        let fail = |msg: String| Err(SchedulerError::InternalConsistency(msg));

        if !self.run_queue.is_consistent() {
            return fail("run queue index out of sync".to_string());
        }

        for (_, id) in self.run_queue.iter() {
            match self.registry.get(&id) {
                Some(p) if p.state.is_queued() => {}
                Some(p) => return fail(format!("queued {} is {}", id, p.state)),
                None => return fail(format!("queued {} has no record", id)),
            }
        }

        let mut running = Vec::new();
        let mut weight_sum = 0;
        for (id, process) in &self.registry {
            if process.id != *id {
                return fail(format!("registry key {} holds {}", id, process.id));
            }
            weight_sum += weights::weight(process.priority());

            if process.state.is_queued()
                && self.run_queue.location(*id) != Some(process.vruntime)
            {
                return fail(format!("{} is {} but not queued at its vruntime", id, process.state));
            }
            if (process.state == ProcessState::Blocked) != self.blocked.contains_key(id) {
                return fail(format!("blocked set disagrees with {}", id));
            }
            if process.state == ProcessState::Running {
                running.push(*id);
            }
        }

        if self.blocked.keys().any(|id| !self.registry.contains_key(id)) {
            return fail("blocked set holds an untracked id".to_string());
        }
        if running.len() > 1 {
            return fail(format!("{} processes running", running.len()));
        }
        if running.first().copied() != self.current {
            return fail(format!(
                "current {:?} disagrees with running {:?}",
                self.current, running
            ));
        }
        if weight_sum != self.aggregate_weight {
            return fail(format!(
                "aggregate weight {} != {}",
                self.aggregate_weight, weight_sum
            ));
        }
        Ok(())
    }

    /// Virtual runtime for a process entering the run queue
    fn entry_vruntime(&self) -> Duration {
        if self.registry.is_empty() {
            return Duration::ZERO;
        }
        self.run_queue.min_vruntime().unwrap_or(Duration::ZERO)
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}
