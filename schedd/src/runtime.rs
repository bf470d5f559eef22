//! # Host Runtime
//!
//! Reads command lines, applies them to the scheduler, and renders the
//! results as text.

use crate::commands::{HostCommand, HostCommandParser, HELP};
use fair_scheduler::{Process, Scheduler, SchedulerConfig, SchedulerError};
use log::{debug, info, LevelFilter};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Host runtime error types
#[derive(Debug, Error)]
pub enum HostRuntimeError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Script error: {0}")]
    ScriptError(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Host runtime configuration
#[derive(Debug, Clone)]
pub struct HostRuntimeConfig {
    /// Scheduler tuning
    pub scheduler: SchedulerConfig,
    /// Optional command script read instead of stdin
    pub script: Option<PathBuf>,
    /// Log verbosity
    pub log_level: LevelFilter,
}

impl Default for HostRuntimeConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            script: None,
            log_level: LevelFilter::Warn,
        }
    }
}

/// What the read loop does after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Host runtime
pub struct HostRuntime {
    /// Configuration
    config: HostRuntimeConfig,
    /// The scheduler being driven
    scheduler: Scheduler,
    /// Lines processed so far
    lines: usize,
    /// Commands that failed
    failures: usize,
}

impl HostRuntime {
    /// Creates a new host runtime and starts the scheduler
    pub fn new(config: HostRuntimeConfig) -> Result<Self, HostRuntimeError> {
        let scheduler = Scheduler::new(config.scheduler.clone())?;
        Ok(Self {
            config,
            scheduler,
            lines: 0,
            failures: 0,
        })
    }

    /// Runs the configured input source
    ///
    /// Reads the script file when one is configured, stdin otherwise.
    pub fn run_configured(&mut self, output: impl Write) -> Result<(), HostRuntimeError> {
        match self.config.script.clone() {
            Some(path) => {
                let file = File::open(&path).map_err(|e| {
                    HostRuntimeError::ScriptError(format!("{}: {}", path.display(), e))
                })?;
                info!("running script {}", path.display());
                self.run(BufReader::new(file), output)
            }
            None => {
                let stdin = io::stdin();
                self.run(stdin.lock(), output)
            }
        }
    }

    /// Runs the command loop
    ///
    /// Returns when:
    /// - Quit command received
    /// - Input exhausted
    ///
    /// A failing command is reported on `output` and the loop continues.
    pub fn run(
        &mut self,
        input: impl BufRead,
        mut output: impl Write,
    ) -> Result<(), HostRuntimeError> {
        for line in input.lines() {
            let line = line?;
            if self.execute_line(&line, &mut output)? == Flow::Quit {
                break;
            }
        }
        output.flush()?;
        Ok(())
    }

    /// Executes one input line
    ///
    /// Blank lines and `#` comments are skipped.
    pub fn execute_line(
        &mut self,
        line: &str,
        output: &mut impl Write,
    ) -> Result<Flow, HostRuntimeError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Flow::Continue);
        }
        self.lines += 1;

        let command = match HostCommandParser::parse(line) {
            Ok(command) => command,
            Err(e) => {
                self.failures += 1;
                writeln!(output, "error: {}", e)?;
                return Ok(Flow::Continue);
            }
        };
        debug!("command: {:?}", command);
        self.execute(command, output)
    }

    /// Executes a parsed command
    pub fn execute(
        &mut self,
        command: HostCommand,
        output: &mut impl Write,
    ) -> Result<Flow, HostRuntimeError> {
        let result = match command {
            HostCommand::Schedule { id, nice } => self
                .scheduler
                .schedule(Process::new(id).with_nice(nice))
                .map(|()| format!("scheduled {} (nice {})", id, nice)),
            HostCommand::SetNice { id, nice } => self
                .scheduler
                .increase_priority(id, i32::from(nice))
                .map(|()| format!("{} nice set to {}", id, nice)),
            HostCommand::Stop { id } => self
                .scheduler
                .stop(id)
                .map(|()| format!("stopped {}", id)),
            HostCommand::Block { id, duration } => self
                .scheduler
                .block(id, duration)
                .map(|()| format!("blocked {} for {}ms", id, duration.as_millis())),
            HostCommand::Unblock { id } => self
                .scheduler
                .unblock(id)
                .map(|()| format!("unblocked {}", id)),
            HostCommand::List => {
                self.render_list(output)?;
                return Ok(Flow::Continue);
            }
            HostCommand::Snapshot => {
                let snapshot = self.scheduler.snapshot();
                writeln!(output, "{}", serde_json::to_string_pretty(&snapshot)?)?;
                return Ok(Flow::Continue);
            }
            HostCommand::Events => {
                for event in self.scheduler.events() {
                    writeln!(output, "{}", event)?;
                }
                return Ok(Flow::Continue);
            }
            HostCommand::Help => {
                writeln!(output, "{}", HELP)?;
                return Ok(Flow::Continue);
            }
            HostCommand::Quit => return Ok(Flow::Quit),
        };

        match result {
            Ok(message) => writeln!(output, "ok: {}", message)?,
            Err(e) => {
                self.failures += 1;
                writeln!(output, "error: {}", e)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn render_list(&self, output: &mut impl Write) -> io::Result<()> {
        let processes = self.scheduler.processes();
        if processes.is_empty() {
            return writeln!(output, "no processes");
        }
        writeln!(output, "PID\tSTATE")?;
        for info in processes {
            writeln!(output, "{}\t{}", info.id.as_raw(), info.state)?;
        }
        Ok(())
    }

    /// Returns the scheduler being driven
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns the number of commands executed
    pub fn line_count(&self) -> usize {
        self.lines
    }

    /// Returns the number of commands that failed
    pub fn failure_count(&self) -> usize {
        self.failures
    }

    /// Stops the scheduler and every remaining process
    pub fn shutdown(self) {
        info!(
            "host exiting after {} commands ({} failed)",
            self.lines, self.failures
        );
        self.scheduler.shutdown();
    }
}
