//! # Scheduler Logger
//!
//! This crate implements structured logging for the `log` facade.
//!
//! ## Philosophy
//!
//! Logging is explicit and structured, not text-based or printf-style.
//! Library crates only call the `log` macros; this crate turns each record
//! into a [`LogEntry`] and hands it to a [`LogSink`]. Rendering to text
//! happens at the sink, at the edge.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Fine-grained tracing
    Trace,
    /// Debug information
    Debug,
    /// Informational messages
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => LogLevel::Trace,
            log::Level::Debug => LogLevel::Debug,
            log::Level::Info => LogLevel::Info,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Error => LogLevel::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.pad(name)
    }
}

/// A structured log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Emitting module
    pub target: String,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// Creates a new log entry
    pub fn new(level: LogLevel, message: String) -> Self {
        Self {
            level,
            target: String::new(),
            message,
            fields: Vec::new(),
        }
    }

    /// Sets the emitting module
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Adds a field to the log entry
    pub fn with_field(mut self, key: String, value: String) -> Self {
        self.fields.push((key, value));
        self
    }

    /// Builds an entry from a `log` record
    pub fn from_record(record: &Record<'_>) -> Self {
        let mut entry = LogEntry::new(record.level().into(), record.args().to_string())
            .with_target(record.target());
        if let Some(thread) = std::thread::current().name() {
            entry = entry.with_field("thread".to_string(), thread.to_string());
        }
        entry
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<5} {}: {}", self.level, self.target, self.message)?;
        for (key, value) in &self.fields {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

/// Destination for log entries
pub trait LogSink: Send + Sync {
    fn write(&self, entry: LogEntry);
}

/// Renders entries to standard error
#[derive(Debug, Default)]
pub struct StderrSink;

impl LogSink for StderrSink {
    fn write(&self, entry: LogEntry) {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        // Nowhere left to report a failed log write.
        let _ = writeln!(handle, "{}", entry);
    }
}

/// Keeps entries in memory for inspection
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the captured entries
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn write(&self, entry: LogEntry) {
        self.entries.lock().push(entry);
    }
}

/// `log` backend forwarding structured entries to a sink
pub struct HostLogger {
    level: LevelFilter,
    sink: Box<dyn LogSink>,
}

impl HostLogger {
    pub fn new(level: LevelFilter, sink: Box<dyn LogSink>) -> Self {
        Self { level, sink }
    }

    /// Installs this logger as the global `log` backend
    pub fn install(self) -> Result<(), SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for HostLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            self.sink.write(LogEntry::from_record(record));
        }
    }

    fn flush(&self) {}
}

/// Installs a stderr logger at `level`
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    HostLogger::new(level, Box::new(StderrSink)).install()
}
