// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock helpers.
//!
//! Browser network and console events carry two clocks: a monotonic
//! `timestamp` and an epoch-based `wallTime` in seconds. Only the latter is
//! meaningful across processes, so every stored timestamp derives from it.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as Unix-epoch milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Convert an event's `wallTime` (epoch seconds, fractional) to epoch ms.
pub fn wall_time_to_ms(wall_time_s: f64) -> f64 {
    wall_time_s * 1000.0
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod tests;
