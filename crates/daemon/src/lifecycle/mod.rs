// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown.

mod startup;
pub use startup::startup;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::browser::BrowserError;
use crate::state::Ctx;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/bp)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Directory for persisted response bodies
    pub bodies_dir: PathBuf,
}

impl Config {
    /// Load configuration for the user-level daemon.
    ///
    /// Uses fixed paths under `~/.local/state/bp/` (or `$XDG_STATE_HOME/bp/`).
    /// One daemon serves one browser for a user.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = crate::env::state_dir()?;

        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            bodies_dir: state_dir.join("bodies"),
            state_dir,
        })
    }
}

/// Daemon state during operation.
///
/// The listener is returned separately from startup to be spawned as a task.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub ctx: Arc<Ctx>,
}

impl DaemonState {
    pub(super) fn new(config: Config, lock_file: File, ctx: Arc<Ctx>) -> Self {
        Self { config, lock_file, ctx }
    }

    /// Shutdown the daemon gracefully: close the protocol client, terminate
    /// the browser, remove the runtime files. Safe to call once the main
    /// loop has observed the shutdown signal.
    pub async fn shutdown(&mut self) {
        info!("Shutting down daemon...");

        if let Some(client) = self.ctx.take_client() {
            client.close().await;
        }

        if let Some(mut browser) = self.ctx.browser.lock().await.take() {
            browser.close().await;
        }

        for path in [&self.config.socket_path, &self.config.lock_path, &self.config.version_path]
        {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "failed to remove runtime file");
                }
            }
        }

        // Lock file handle is released when self drops

        info!("Daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Protocol client error: {0}")]
    Cdp(#[from] crate::cdp::CdpError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
