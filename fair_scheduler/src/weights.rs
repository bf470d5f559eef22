//! # Weight Table
//!
//! Static mapping from priority to scheduling weight, and the time-slice
//! and virtual-runtime arithmetic built on it.
//!
//! Priority 20 (nice 0) has weight 1024. Each step toward a higher
//! priority index lowers the weight by roughly 10%, i.e. roughly 10% less
//! CPU share per nice level.

use core_types::Priority;
use std::time::Duration;

/// Scheduling weight per priority index (`nice + 20`)
pub const WEIGHTS: [u64; Priority::LEVELS] = [
    /* -20 */ 88761, 71755, 56483, 46273, 36291,
    /* -15 */ 29154, 23254, 18705, 14949, 11916,
    /* -10 */ 9548, 7620, 6100, 4904, 3906,
    /*  -5 */ 3121, 2501, 1991, 1586, 1277,
    /*   0 */ 1024, 820, 655, 526, 423,
    /*   5 */ 335, 272, 215, 172, 137,
    /*  10 */ 110, 87, 70, 56, 45,
    /*  15 */ 36, 29, 23, 18, 15,
];

/// Weight of a nice-0 process
pub const NICE_0_WEIGHT: u64 = WEIGHTS[Priority::BASELINE.as_index()];

const NANOS_PER_MILLI: u128 = 1_000_000;

/// Returns the scheduling weight for a priority
pub fn weight(priority: Priority) -> u64 {
    WEIGHTS[priority.as_index()]
}

/// Computes a time slice from a process's share of the aggregate weight
///
/// `max(min_slice, round(latency * weight / aggregate))`, rounded to whole
/// milliseconds. An aggregate smaller than `weight` is treated as
/// `weight` (sole process).
pub fn time_slice(
    weight: u64,
    aggregate: u64,
    latency: Duration,
    min_slice: Duration,
) -> Duration {
    let aggregate = aggregate.max(weight).max(1) as u128;
    let share_nanos = latency.as_nanos() * weight as u128 / aggregate;
    let millis = (share_nanos + NANOS_PER_MILLI / 2) / NANOS_PER_MILLI;
    let slice = Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX));
    slice.max(min_slice)
}

/// Normalizes real running time to nice-0-equivalent virtual time
///
/// `elapsed * NICE_0_WEIGHT / weight(priority)`: processes with a lower
/// weight accrue virtual runtime faster.
pub fn virtual_delta(elapsed: Duration, priority: Priority) -> Duration {
    let nanos = elapsed.as_nanos() * NICE_0_WEIGHT as u128 / weight(priority) as u128;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}
