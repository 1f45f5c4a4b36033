// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon process management utilities.
//!
//! Functions for starting, stopping, and monitoring the bpd daemon process.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use crate::client::ClientError;
use crate::env;

/// Path of the daemon's Unix socket.
pub fn daemon_socket() -> Result<PathBuf, ClientError> {
    Ok(daemon_dir()?.join("daemon.sock"))
}

/// The daemon's state directory.
pub fn daemon_dir() -> Result<PathBuf, ClientError> {
    env::state_dir().ok_or(ClientError::NoStateDir)
}

/// Start the daemon in the background, returning the child process handle.
pub fn start_daemon_background() -> Result<std::process::Child, ClientError> {
    let bpd_path = find_bpd_binary()?;

    Command::new(&bpd_path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))
}

/// Stop the daemon synchronously using SIGTERM + polling.
///
/// Used during version-mismatch restart where we're in a sync context.
pub fn stop_daemon_sync() {
    if let Ok(Some(pid)) = read_daemon_pid() {
        kill_signal("-15", pid);

        let start = Instant::now();
        let timeout = env::timeout_exit();
        while start.elapsed() < timeout {
            if !process_exists(pid) {
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        if process_exists(pid) {
            kill_signal("-9", pid);
            let start = Instant::now();
            while start.elapsed() < timeout {
                if !process_exists(pid) {
                    break;
                }
                std::thread::sleep(Duration::from_millis(50));
            }
        }
    }

    if let Ok(dir) = daemon_dir() {
        let _ = std::fs::remove_file(dir.join("daemon.sock"));
    }
}

/// Wait for a process to exit.
pub async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(env::poll_interval()).await;
    }
    false
}

/// Read the daemon pid from its PID file.
pub fn read_daemon_pid() -> Result<Option<u32>, ClientError> {
    let path = daemon_dir()?.join("daemon.pid");
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(content.trim().parse::<u32>().ok()),
        Err(_) => Ok(None),
    }
}

/// Probe whether anything is accepting on the socket.
pub fn probe_socket(path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(path).is_ok()
}

/// Remove a socket file nothing is listening on.
pub fn cleanup_stale_socket() -> Result<(), ClientError> {
    let path = daemon_socket()?;
    if path.exists() {
        std::fs::remove_file(&path)?;
    }
    Ok(())
}

/// Extract the daemon's startup error from its log, scanning back from the
/// most recent startup marker.
pub fn read_startup_error() -> Option<String> {
    let log_path = daemon_dir().ok()?.join("daemon.log");
    let content = std::fs::read_to_string(log_path).ok()?;

    let marker_at = content.rfind("--- bpd: starting (pid: ")?;
    content[marker_at..]
        .lines()
        .find(|line| line.contains("ERROR Failed to start daemon:"))
        .and_then(|line| line.split("ERROR Failed to start daemon:").nth(1))
        .map(|msg| msg.trim().to_string())
}

fn kill_signal(signal: &str, pid: u32) {
    let _ = Command::new("kill").args([signal, &pid.to_string()]).status();
}

fn process_exists(pid: u32) -> bool {
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Find the bpd binary: env override, then next to the current executable,
/// then the dev target dir, then PATH.
fn find_bpd_binary() -> Result<PathBuf, ClientError> {
    if let Some(path) = env::daemon_binary() {
        return Ok(PathBuf::from(path));
    }

    let current_exe = std::env::current_exe().ok();
    if let Some(dir) = current_exe.as_ref().and_then(|p| p.parent()) {
        let sibling = dir.join("bpd");
        if sibling.exists() {
            return Ok(sibling);
        }
    }

    // Dev builds: the workspace target directory
    let is_debug_build = current_exe
        .as_ref()
        .and_then(|p| p.to_str())
        .map(|s| s.contains("target/debug"))
        .unwrap_or(false);
    if is_debug_build {
        if let Some(manifest_dir) = env::cargo_manifest_dir() {
            let dev_path = PathBuf::from(manifest_dir)
                .parent()
                .and_then(|p| p.parent())
                .map(|p| p.join("target/debug/bpd"));
            if let Some(path) = dev_path {
                if path.exists() {
                    return Ok(path);
                }
            }
        }
    }

    // Fall back to PATH
    Ok(PathBuf::from("bpd"))
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
