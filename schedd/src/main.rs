//! # Scheduler Host Daemon
//!
//! Main entry point for the scheduler host.

use schedd::{HostRuntime, HostRuntimeConfig};
use std::env;
use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

fn main() {
    let args: Vec<String> = env::args().collect();

    let config = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(&args[0]);
        process::exit(1);
    });

    if let Err(e) = sched_logger::init(config.log_level) {
        eprintln!("Failed to install logger: {}", e);
    }

    let mut runtime = HostRuntime::new(config).unwrap_or_else(|e| {
        eprintln!("Failed to create runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.run_configured(io::stdout().lock());
    runtime.shutdown();

    if let Err(e) = result {
        eprintln!("Runtime error: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<HostRuntimeConfig, String> {
    let mut config = HostRuntimeConfig::default();
    let mut i = 1;

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--tick-ms" => {
                config.scheduler.tick_interval = millis_arg(args, &mut i, flag)?;
            }
            "--cleanup-ms" => {
                config.scheduler.cleanup_interval = millis_arg(args, &mut i, flag)?;
            }
            "--latency-ms" => {
                config.scheduler.sched_latency = millis_arg(args, &mut i, flag)?;
            }
            "--min-slice-ms" => {
                config.scheduler.min_time_slice = millis_arg(args, &mut i, flag)?;
            }
            "--workers" | "-w" => {
                let value = value_arg(args, &mut i, flag)?;
                config.scheduler.worker_threads = value
                    .parse()
                    .map_err(|_| format!("Invalid worker count: {}", value))?;
            }
            "--log-level" | "-l" => {
                let value = value_arg(args, &mut i, flag)?;
                config.log_level = value
                    .parse()
                    .map_err(|_| format!("Invalid log level: {}", value))?;
            }
            "--script" | "-s" => {
                config.script = Some(PathBuf::from(value_arg(args, &mut i, flag)?));
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn value_arg<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing value for {}", flag))
}

fn millis_arg(args: &[String], i: &mut usize, flag: &str) -> Result<Duration, String> {
    let value = value_arg(args, i, flag)?;
    let millis: u64 = value
        .parse()
        .map_err(|_| format!("Invalid {} value: {}", flag, value))?;
    if millis == 0 {
        return Err(format!("{} must be positive", flag));
    }
    Ok(Duration::from_millis(millis))
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --tick-ms <MS>           Dispatch loop period (default 1)");
    eprintln!("  --cleanup-ms <MS>        Stopped-archive cleanup period (default 500)");
    eprintln!("  --latency-ms <MS>        Scheduling latency (default 48)");
    eprintln!("  --min-slice-ms <MS>      Minimum time slice (default 6)");
    eprintln!("  -w, --workers <N>        Worker threads for simulated I/O (default 4)");
    eprintln!("  -l, --log-level <LEVEL>  off, error, warn, info, debug, trace (default warn)");
    eprintln!("  -s, --script <FILE>      Read commands from FILE instead of stdin");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --script demo.sched", program);
    eprintln!("  {} --latency-ms 24 --log-level info", program);
}
