//! Integration tests for the schedd host runtime

use core_types::{ProcessId, ProcessState};
use fair_scheduler::SchedulerConfig;
use schedd::{HostRuntime, HostRuntimeConfig, HostRuntimeError};
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

fn script_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn run_script(contents: &str) -> (HostRuntime, String) {
    let file = script_file(contents);
    let config = HostRuntimeConfig {
        script: Some(file.path().to_path_buf()),
        ..HostRuntimeConfig::default()
    };

    let mut runtime = HostRuntime::new(config).unwrap();
    let mut output = Vec::new();
    runtime.run_configured(&mut output).unwrap();
    (runtime, String::from_utf8(output).unwrap())
}

#[test]
fn test_scripted_session() {
    let script = r#"
        # three processes, one stopped
        sched 1
        sched 2 -5
        sched_p 3 10
        stop_p 2
        curr_p
    "#;

    let (runtime, output) = run_script(script);

    assert!(output.contains("ok: scheduled pid:1 (nice 0)"));
    assert!(output.contains("ok: stopped pid:2"));
    assert!(output.contains("PID\tSTATE"));
    assert!(!output.contains("error"));

    let listed: Vec<ProcessId> = runtime
        .scheduler()
        .processes()
        .iter()
        .map(|info| info.id)
        .collect();
    assert_eq!(listed, vec![ProcessId::new(1), ProcessId::new(3)]);
    assert_eq!(runtime.line_count(), 5);
    runtime.shutdown();
}

#[test]
fn test_script_errors_do_not_abort() {
    let script = "sched 1\nnice 1 42\nunblock 1\nblock 7 10\nsched 2\n";

    let (runtime, output) = run_script(script);

    assert!(output.contains("error: Invalid nice value"));
    assert!(output.contains("error: Process not blocked: pid:1"));
    assert!(output.contains("error: Process not found: pid:7"));
    assert!(output.contains("ok: scheduled pid:2"));
    assert_eq!(runtime.failure_count(), 3);
    runtime.shutdown();
}

#[test]
fn test_missing_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = HostRuntimeConfig {
        script: Some(dir.path().join("missing.sched")),
        ..HostRuntimeConfig::default()
    };

    let mut runtime = HostRuntime::new(config).unwrap();
    let result = runtime.run_configured(Vec::new());
    assert!(matches!(result, Err(HostRuntimeError::ScriptError(_))));
    runtime.shutdown();
}

#[test]
fn test_blocked_process_returns_after_duration() {
    let (runtime, output) = run_script("sched 1\nblock 1 20\n");
    assert!(output.contains("ok: blocked pid:1 for 20ms"));

    let id = ProcessId::new(1);
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let state = runtime.scheduler().process(id).unwrap().state;
        if state.is_queued() {
            break;
        }
        assert_eq!(state, ProcessState::Blocked);
        assert!(Instant::now() < deadline, "process never unblocked");
        thread::sleep(Duration::from_millis(5));
    }
    runtime.scheduler().verify_invariants().unwrap();
    runtime.shutdown();
}

#[test]
fn test_custom_scheduler_config() {
    let config = HostRuntimeConfig {
        scheduler: SchedulerConfig {
            sched_latency: Duration::from_millis(24),
            min_time_slice: Duration::from_millis(3),
            worker_threads: 1,
            ..SchedulerConfig::default()
        },
        ..HostRuntimeConfig::default()
    };

    let mut runtime = HostRuntime::new(config).unwrap();
    let mut output = Vec::new();
    runtime
        .run("sched 1\nsched 2\nsnapshot\n".as_bytes(), &mut output)
        .unwrap();

    let output = String::from_utf8(output).unwrap();
    let json_start = output.find('[').unwrap();
    let snapshot: serde_json::Value = serde_json::from_str(&output[json_start..]).unwrap();
    assert_eq!(snapshot.as_array().unwrap().len(), 2);
    runtime.shutdown();
}

#[test]
fn test_shutdown_with_pending_block_is_prompt() {
    let (runtime, _) = run_script("sched 1\nblock 1 600000\n");

    let start = Instant::now();
    runtime.shutdown();
    assert!(start.elapsed() < Duration::from_secs(5));
}
