//! # Core Types
//!
//! This crate defines the fundamental types shared by the scheduler crates.
//!
//! ## Philosophy
//!
//! - **Validated at construction**: a [`Nice`] is always within [-20, 19].
//! - **Identifiers are caller-owned**: a [`ProcessId`] is never generated here.
//!
//! ## Key Types
//!
//! - [`ProcessId`]: Identifier of a simulated process
//! - [`Nice`] / [`Priority`]: Scheduling hint and its derived table index
//! - [`ProcessState`]: Lifecycle state of a process
//! - [`ProcessInfo`]: (id, state) pair reported by listings

pub mod ids;
pub mod nice;
pub mod process_state;

pub use ids::ProcessId;
pub use nice::{InvalidNice, Nice, Priority};
pub use process_state::{ProcessInfo, ProcessState};
