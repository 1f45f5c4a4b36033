// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use bp_wire::{ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

use crate::daemon_process::{
    cleanup_stale_socket, daemon_socket, probe_socket, read_startup_error,
    start_daemon_background, stop_daemon_sync,
};
use crate::env::{poll_interval, timeout_connect, timeout_exit, timeout_ipc, VERSION};

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running (start it with 'bp start')")]
    DaemonNotRunning,

    #[error("failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The daemon answered with `ok: false`. The data payload (ambiguous
    /// matches, session lists) rides along for rendering.
    #[error("{message}")]
    Rejected { message: String, data: Option<serde_json::Value> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not determine state directory")]
    NoStateDir,
}

/// Daemon client. One IPC connection per request.
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to an existing daemon (no auto-start).
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = daemon_socket()?;
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(Self { socket_path })
    }

    /// Connect, starting the daemon if it isn't running. Restarts on a
    /// version mismatch between this CLI and the daemon's version file.
    pub fn connect_or_start() -> Result<Self, ClientError> {
        let state_dir = crate::env::state_dir().ok_or(ClientError::NoStateDir)?;
        let version_path = state_dir.join("daemon.version");
        if let Ok(daemon_version) = std::fs::read_to_string(&version_path) {
            if daemon_version.trim() != VERSION {
                eprintln!(
                    "warn: daemon version {} does not match cli version {}, restarting daemon",
                    daemon_version.trim(),
                    VERSION
                );
                stop_daemon_sync();
            }
        }

        match Self::connect() {
            Ok(client) => {
                // The daemon may have crashed, leaving a stale socket file
                if probe_socket(&client.socket_path) {
                    Ok(client)
                } else {
                    cleanup_stale_socket()?;
                    let child = start_daemon_background()?;
                    Self::connect_with_retry(timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background()?;
                Self::connect_with_retry(timeout_connect(), child)
            }
            Err(e) => Err(e),
        }
    }

    fn connect_with_retry(
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            // Daemon exiting early means startup failed; surface the reason
            if let Ok(Some(status)) = child.try_wait() {
                let poll_start = Instant::now();
                while poll_start.elapsed() < timeout_exit() {
                    if let Some(err) = read_startup_error() {
                        return Err(ClientError::DaemonStartFailed(err));
                    }
                    std::thread::sleep(poll_interval());
                }
                return Err(ClientError::DaemonStartFailed(format!("exited with {status}")));
            }

            match Self::connect() {
                Ok(client) => {
                    if probe_socket(&client.socket_path) {
                        return Ok(client);
                    }
                    std::thread::sleep(poll_interval());
                }
                Err(ClientError::DaemonNotRunning) => std::thread::sleep(poll_interval()),
                Err(e) => return Err(e),
            }
        }
        Err(ClientError::DaemonStartTimeout)
    }

    /// Send a request and receive the raw response.
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        bp_wire::write_request(&mut writer, request, timeout_ipc()).await?;

        // Command handlers have their own deadlines well above the IPC
        // timeout; give the read side the command budget plus slack
        let command_budget = request
            .params
            .get("timeout")
            .and_then(|v| v.as_u64())
            .map(|s| Duration::from_secs(s + 10))
            .unwrap_or(Duration::from_secs(70));
        let bytes = tokio::time::timeout(command_budget, bp_wire::read_message(&mut reader))
            .await
            .map_err(|_| ProtocolError::Timeout)??;
        Ok(bp_wire::decode(&bytes)?)
    }

    /// Send a request and return its data payload, mapping `ok: false` to
    /// [`ClientError::Rejected`].
    pub async fn request(
        &self,
        cmd: &str,
        params: serde_json::Value,
        debug: bool,
    ) -> Result<serde_json::Value, ClientError> {
        let mut request = Request::with_params(cmd, params);
        request.debug = debug;
        let response = self.send(&request).await?;
        if response.ok {
            Ok(response.data.unwrap_or(serde_json::Value::Null))
        } else {
            Err(ClientError::Rejected {
                message: response.error.unwrap_or_else(|| "unknown error".to_string()),
                data: response.data,
            })
        }
    }

    pub fn socket_path(&self) -> &std::path::Path {
        &self.socket_path
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
