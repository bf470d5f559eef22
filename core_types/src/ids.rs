//! Unique identifiers for system entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Unique identifier for a simulated process
///
/// Identifiers are supplied by the caller (the scheduler never generates
/// them). Ordering on `ProcessId` is the tie-breaker between processes
/// with equal virtual runtime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProcessId(i32);

impl ProcessId {
    /// Creates a process ID from a raw pid value
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw pid value
    pub const fn as_raw(&self) -> i32 {
        self.0
    }
}

impl From<i32> for ProcessId {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl FromStr for ProcessId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i32>().map(Self)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid:{}", self.0)
    }
}
