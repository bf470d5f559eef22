//! # Scheduler Host
//!
//! This crate provides the command-line host for the fair scheduler.
//!
//! ## Philosophy
//!
//! - **Host owns I/O**: The scheduler never prints
//! - **Commands are validated at the edge**: Bad input never reaches the core
//! - **Scripts and terminals are the same**: Both are line streams
//!
//! ## Responsibilities
//!
//! The host:
//! - Starts a scheduler from command-line tuning
//! - Reads commands from stdin or a script file
//! - Reports the outcome of every command and keeps going after failures
//! - Tears the scheduler down on exit

pub mod commands;
pub mod runtime;

pub use commands::{HostCommand, HostCommandError, HostCommandParser};
pub use runtime::{Flow, HostRuntime, HostRuntimeConfig, HostRuntimeError};
