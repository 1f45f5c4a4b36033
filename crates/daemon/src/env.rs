// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

/// Resolve state directory: BP_STATE_DIR > XDG_STATE_HOME/bp > ~/.local/state/bp
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("BP_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("bp"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/bp"))
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    std::env::var("BP_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Shutdown drain timeout (default 5s, configurable via `BP_DRAIN_TIMEOUT_MS`).
pub fn drain_timeout() -> Duration {
    std::env::var("BP_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Browser binary override.
pub fn browser_bin() -> Option<String> {
    std::env::var("BP_BROWSER_BIN").ok().filter(|s| !s.is_empty())
}

/// Remote debugging port the browser is launched with.
pub fn browser_port() -> u16 {
    std::env::var("BP_BROWSER_PORT").ok().and_then(|s| s.parse::<u16>().ok()).unwrap_or(9222)
}

/// Extra browser arguments (whitespace-separated), e.g. `--no-sandbox` in
/// containers.
pub fn browser_args() -> Vec<String> {
    std::env::var("BP_BROWSER_ARGS")
        .ok()
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Maximum reconnection attempts before the daemon gives up.
pub fn max_reconnect_attempts() -> u32 {
    std::env::var("BP_MAX_RECONNECT_ATTEMPTS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(5)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
