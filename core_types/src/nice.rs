//! Niceness and the priority index derived from it

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Nice value outside of [-20, 19]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid nice value {0}: expected -20 (highest priority) to 19 (lowest priority)")]
pub struct InvalidNice(pub i32);

/// Caller-facing scheduling hint
///
/// Lower nice means higher priority. The value is validated on
/// construction, so a `Nice` is always within [-20, 19].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i32", into = "i32")]
pub struct Nice(i8);

impl Nice {
    /// Highest priority
    pub const MIN: Nice = Nice(-20);
    /// Lowest priority
    pub const MAX: Nice = Nice(19);
    /// Baseline niceness of a freshly created process
    pub const DEFAULT: Nice = Nice(0);

    /// Validates and wraps a nice value
    pub fn new(value: i32) -> Result<Self, InvalidNice> {
        if (Self::MIN.0 as i32..=Self::MAX.0 as i32).contains(&value) {
            Ok(Self(value as i8))
        } else {
            Err(InvalidNice(value))
        }
    }

    /// Returns the raw nice value
    pub const fn get(&self) -> i8 {
        self.0
    }

    /// Returns the derived priority index (`nice + 20`)
    pub const fn priority(&self) -> Priority {
        Priority((self.0 + 20) as u8)
    }
}

impl Default for Nice {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i32> for Nice {
    type Error = InvalidNice;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Nice> for i32 {
    fn from(nice: Nice) -> Self {
        nice.0 as i32
    }
}

impl fmt::Display for Nice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derived priority index in [0, 39]
///
/// Used to index the weight table. Only constructible from a [`Nice`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Priority(u8);

impl Priority {
    /// Number of distinct priority levels
    pub const LEVELS: usize = 40;
    /// Priority of a nice-0 process
    pub const BASELINE: Priority = Nice::DEFAULT.priority();

    /// Returns the table index for this priority
    pub const fn as_index(&self) -> usize {
        self.0 as usize
    }

    /// Returns the raw priority value
    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
