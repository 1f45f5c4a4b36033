// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI.

use std::path::PathBuf;
use std::time::Duration;

/// CLI version string, matched against the daemon's version file.
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

/// Resolve state directory: BP_STATE_DIR > XDG_STATE_HOME/bp > ~/.local/state/bp
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("BP_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("bp"));
    }
    std::env::var("HOME").ok().map(|home| PathBuf::from(home).join(".local/state/bp"))
}

/// Timeout for IPC requests.
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("BP_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for the daemon to start (browser launch included).
pub fn timeout_connect() -> Duration {
    parse_duration_ms("BP_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(30))
}

/// Timeout for waiting for the daemon process to exit.
pub fn timeout_exit() -> Duration {
    parse_duration_ms("BP_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(5))
}

/// Polling interval for connection retries.
pub fn poll_interval() -> Duration {
    parse_duration_ms("BP_CONNECT_POLL_MS").unwrap_or(Duration::from_millis(50))
}

/// Daemon binary override.
pub fn daemon_binary() -> Option<String> {
    std::env::var("BP_DAEMON_BIN").ok().filter(|s| !s.is_empty())
}

/// CARGO_MANIFEST_DIR, for dev-build daemon discovery.
pub fn cargo_manifest_dir() -> Option<String> {
    std::env::var("CARGO_MANIFEST_DIR").ok()
}
