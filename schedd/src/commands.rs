//! # Host Control Commands
//!
//! Provides the line-oriented command surface of the scheduler host.
//!
//! ## Command Set
//!
//! - `sched <pid> [nice]` - Admit a new process
//! - `nice <pid> <nice>` - Change a process's niceness
//! - `stop <pid>` - Stop a process
//! - `block <pid> <ms>` - Block a process for a simulated I/O wait
//! - `unblock <pid>` - Complete a pending I/O wait early
//! - `list` - List processes and their states
//! - `snapshot` - Dump detailed process state as JSON
//! - `events` - Show recent scheduling events
//! - `help` - Show command help
//! - `quit` - Exit the host
//!
//! Arguments are validated here; malformed input never reaches the
//! scheduler.

use core_types::{Nice, ProcessId};
use std::time::Duration;
use thiserror::Error;

/// Host command error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostCommandError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid process ID: {0}")]
    InvalidProcessId(String),

    #[error("Invalid nice value: {0} (expected -20 to 19)")]
    InvalidNice(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// Host commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// Admit a new process
    Schedule { id: ProcessId, nice: Nice },

    /// Change a process's niceness
    SetNice { id: ProcessId, nice: Nice },

    /// Stop a process
    Stop { id: ProcessId },

    /// Block a process for `duration`
    Block { id: ProcessId, duration: Duration },

    /// Complete a pending block early
    Unblock { id: ProcessId },

    /// List processes
    List,

    /// Dump detailed state
    Snapshot,

    /// Show the audit ring
    Events,

    /// Show command help
    Help,

    /// Quit the host
    Quit,
}

/// Command help text
pub const HELP: &str = "\
Commands:
  sched <pid> [nice]   Admit a process (nice defaults to 0)
  nice <pid> <nice>    Change niceness (-20 highest .. 19 lowest)
  stop <pid>           Stop a process
  block <pid> <ms>     Block a process for <ms> milliseconds
  unblock <pid>        Complete a pending block early
  list                 List processes and states
  snapshot             Print detailed state as JSON
  events               Print recent scheduling events
  help                 Show this help
  quit                 Exit";

/// Host command parser
pub struct HostCommandParser;

impl HostCommandParser {
    /// Parses a command string
    pub fn parse(input: &str) -> Result<HostCommand, HostCommandError> {
        let input = input.trim();

        if input.is_empty() {
            return Err(HostCommandError::InvalidCommand(
                "Empty command".to_string(),
            ));
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();
        let args = &parts[1..];

        match cmd.as_str() {
            "sched" | "sched_p" => Self::parse_sched(args),
            "nice" | "incr_p" => Self::parse_nice(args),
            "stop" | "stop_p" => Ok(HostCommand::Stop {
                id: Self::pid_arg(args)?,
            }),
            "block" | "block_p" => Self::parse_block(args),
            "unblock" | "unblock_p" => Ok(HostCommand::Unblock {
                id: Self::pid_arg(args)?,
            }),
            "list" | "curr_p" | "ps" => Ok(HostCommand::List),
            "snapshot" => Ok(HostCommand::Snapshot),
            "events" => Ok(HostCommand::Events),
            "help" => Ok(HostCommand::Help),
            "quit" | "q" | "exit" => Ok(HostCommand::Quit),
            _ => Err(HostCommandError::UnknownCommand(cmd)),
        }
    }

    fn parse_sched(args: &[&str]) -> Result<HostCommand, HostCommandError> {
        let id = Self::pid_arg(args)?;
        let nice = match args.get(1).copied() {
            Some(raw) => Self::parse_nice_value(raw)?,
            None => Nice::DEFAULT,
        };
        Ok(HostCommand::Schedule { id, nice })
    }

    fn parse_nice(args: &[&str]) -> Result<HostCommand, HostCommandError> {
        let id = Self::pid_arg(args)?;
        let raw = args
            .get(1)
            .copied()
            .ok_or_else(|| HostCommandError::MissingArgument("nice value".to_string()))?;
        let nice = Self::parse_nice_value(raw)?;
        Ok(HostCommand::SetNice { id, nice })
    }

    fn parse_block(args: &[&str]) -> Result<HostCommand, HostCommandError> {
        let id = Self::pid_arg(args)?;
        let raw = args
            .get(1)
            .copied()
            .ok_or_else(|| HostCommandError::MissingArgument("duration (ms)".to_string()))?;
        let millis: u64 = raw
            .parse()
            .map_err(|_| HostCommandError::InvalidDuration(raw.to_string()))?;
        Ok(HostCommand::Block {
            id,
            duration: Duration::from_millis(millis),
        })
    }

    /// Parses the leading process ID argument
    ///
    /// Accepts a bare integer or the display form `pid:<n>`.
    fn pid_arg(args: &[&str]) -> Result<ProcessId, HostCommandError> {
        let raw = args
            .first()
            .copied()
            .ok_or_else(|| HostCommandError::MissingArgument("process ID".to_string()))?;
        let digits = raw.strip_prefix("pid:").unwrap_or(raw);
        digits
            .parse()
            .map_err(|_| HostCommandError::InvalidProcessId(raw.to_string()))
    }

    fn parse_nice_value(raw: &str) -> Result<Nice, HostCommandError> {
        let value: i32 = raw
            .parse()
            .map_err(|_| HostCommandError::InvalidNice(raw.to_string()))?;
        Nice::new(value).map_err(|_| HostCommandError::InvalidNice(raw.to_string()))
    }
}
