//! Block/Unblock Race Tests
//!
//! Validates that a blocked process is re-admitted exactly once whether
//! the simulated I/O completion or a manual unblock gets there first.

use core_types::{ProcessId, ProcessState};
use fair_scheduler::{Process, ScheduleEvent, Scheduler, SchedulerError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tests_resilience::{pid, stress_config, wait_for};

fn count_events(scheduler: &Scheduler, id: ProcessId) -> (usize, usize) {
    let events = scheduler.events();
    let blocked = events
        .iter()
        .filter(|e| matches!(e, ScheduleEvent::Blocked { id: b, .. } if *b == id))
        .count();
    let unblocked = events
        .iter()
        .filter(|e| matches!(e, ScheduleEvent::Unblocked { id: u, .. } if *u == id))
        .count();
    (blocked, unblocked)
}

fn is_queued(scheduler: &Scheduler, id: ProcessId) -> bool {
    scheduler
        .process(id)
        .map(|snapshot| snapshot.state.is_queued())
        .unwrap_or(false)
}

/// Test: Manual unblock racing I/O completion re-admits exactly once
#[test]
fn test_unblock_exactly_once() {
    let scheduler = Scheduler::new(stress_config()).expect("Failed to start scheduler");
    let id = pid(1);
    scheduler.schedule(Process::new(id)).unwrap();

    for round in 0..50u64 {
        scheduler.block(id, Duration::from_millis(round % 3)).unwrap();
        match scheduler.unblock(id) {
            Ok(()) | Err(SchedulerError::NotBlocked(_)) => {}
            Err(err) => panic!("unexpected unblock failure: {}", err),
        }
        assert!(wait_for(Duration::from_secs(5), || is_queued(&scheduler, id)));
        scheduler.verify_invariants().unwrap();
    }

    // Give stragglers a chance to fire and be rejected.
    thread::sleep(Duration::from_millis(20));
    let (blocked, unblocked) = count_events(&scheduler, id);
    assert_eq!(blocked, 50);
    assert_eq!(unblocked, 50);
    assert_eq!(scheduler.aggregate_weight(), 1024);
}

/// Test: Concurrent manual unblocks of one process, one winner
#[test]
fn test_concurrent_manual_unblocks() {
    let scheduler = Arc::new(Scheduler::new(stress_config()).expect("Failed to start scheduler"));
    let id = pid(7);
    scheduler.schedule(Process::new(id)).unwrap();
    scheduler.block(id, Duration::from_secs(60)).unwrap();

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let scheduler = Arc::clone(&scheduler);
            thread::spawn(move || scheduler.unblock(id).is_ok())
        })
        .collect();
    let winners = workers
        .into_iter()
        .map(|worker| worker.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
    assert!(is_queued(&scheduler, id));
    scheduler.verify_invariants().unwrap();
}

/// Test: A stopped process is not revived by its pending I/O
#[test]
fn test_stop_while_blocked_stays_stopped() {
    let scheduler = Scheduler::new(stress_config()).expect("Failed to start scheduler");
    let id = pid(3);
    scheduler.schedule(Process::new(id)).unwrap();
    scheduler.block(id, Duration::from_millis(10)).unwrap();
    scheduler.stop(id).unwrap();

    thread::sleep(Duration::from_millis(50));
    assert!(scheduler.processes().is_empty());
    assert_eq!(
        scheduler.unblock(id),
        Err(SchedulerError::NotBlocked(id))
    );
    assert_eq!(scheduler.aggregate_weight(), 0);
    scheduler.verify_invariants().unwrap();
}

fn state_of(scheduler: &Scheduler, id: ProcessId) -> Option<ProcessState> {
    scheduler.process(id).map(|snapshot| snapshot.state)
}

/// Test: An earlier block's I/O completion does not end a later block
#[test]
fn test_reblock_outlives_earlier_completion() {
    let scheduler = Scheduler::new(stress_config()).expect("Failed to start scheduler");
    let id = pid(11);
    scheduler.schedule(Process::new(id)).unwrap();

    scheduler.block(id, Duration::from_millis(100)).unwrap();
    scheduler.unblock(id).unwrap();
    scheduler.block(id, Duration::from_secs(30)).unwrap();

    // Well past the first block's completion.
    thread::sleep(Duration::from_millis(400));
    assert_eq!(state_of(&scheduler, id), Some(ProcessState::Blocked));
    let (blocked, unblocked) = count_events(&scheduler, id);
    assert_eq!(blocked, 2);
    assert_eq!(unblocked, 1);

    scheduler.unblock(id).unwrap();
    assert!(is_queued(&scheduler, id));
    scheduler.verify_invariants().unwrap();
    scheduler.shutdown();
}

/// Test: A stopped-then-readmitted process keeps its new block
#[test]
fn test_readmitted_block_outlives_stale_completion() {
    let scheduler = Scheduler::new(stress_config()).expect("Failed to start scheduler");
    let id = pid(12);
    scheduler.schedule(Process::new(id)).unwrap();
    scheduler.block(id, Duration::from_millis(100)).unwrap();
    scheduler.stop(id).unwrap();

    scheduler.schedule(Process::new(id)).unwrap();
    scheduler.block(id, Duration::from_secs(30)).unwrap();

    thread::sleep(Duration::from_millis(400));
    assert_eq!(state_of(&scheduler, id), Some(ProcessState::Blocked));
    let (_, unblocked) = count_events(&scheduler, id);
    assert_eq!(unblocked, 0);
    assert_eq!(scheduler.aggregate_weight(), 1024);
    scheduler.verify_invariants().unwrap();
    scheduler.shutdown();
}
