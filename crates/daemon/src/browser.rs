// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Browser process management.
//!
//! Launches a headless Chromium-family browser with remote debugging enabled
//! and discovers its WebSocket URL through the `/json/version` endpoint. The
//! URL is re-fetched on every request because the browser-scoped GUID path
//! changes across browser restarts — the reconnection supervisor relies on
//! that to find a browser the harness restarted on the same port.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::env;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("no browser binary found (tried: {0})")]
    NotFound(String),

    #[error("failed to launch browser: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("browser exited during startup ({0})")]
    EarlyExit(String),

    #[error("debugging endpoint not ready: {0}")]
    Endpoint(String),
}

const CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "brave-browser",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
];

/// How long to wait for the debugging endpoint after spawn.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(20);
const STARTUP_POLL: Duration = Duration::from_millis(200);
/// Grace period between SIGTERM and SIGKILL on close.
const TERM_GRACE: Duration = Duration::from_secs(3);

/// A running browser process.
pub struct Browser {
    child: Option<Child>,
    pid: Option<u32>,
    port: u16,
}

impl Browser {
    /// Launch the browser headless with remote debugging on the configured
    /// port and wait for the debugging endpoint to come up.
    pub async fn launch(state_dir: &Path) -> Result<Self, BrowserError> {
        let binary = find_binary()?;
        let port = env::browser_port();
        let profile = state_dir.join("profile");

        let mut cmd = Command::new(&binary);
        cmd.arg(format!("--remote-debugging-port={port}"))
            .arg("--headless=new")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg(format!("--user-data-dir={}", profile.display()))
            .args(env::browser_args())
            .arg("about:blank")
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;
        let pid = child.id();
        info!(binary = %binary.display(), port, pid, "browser launched");

        // Poll the endpoint until it answers, watching for early exit
        let deadline = tokio::time::Instant::now() + STARTUP_TIMEOUT;
        loop {
            if let Ok(Some(status)) = child.try_wait() {
                return Err(BrowserError::EarlyExit(status.to_string()));
            }
            match fetch_ws_url(port).await {
                Ok(url) => {
                    debug!(url = %url, "debugging endpoint ready");
                    break;
                }
                Err(e) => {
                    if tokio::time::Instant::now() >= deadline {
                        let _ = child.kill().await;
                        return Err(e);
                    }
                }
            }
            tokio::time::sleep(STARTUP_POLL).await;
        }

        Ok(Self { child: Some(child), pid, port })
    }

    /// Browser process id, when known.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Debugging port the browser was launched with.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Current WebSocket URL. Fetched fresh: the GUID path changes whenever
    /// the browser process is replaced.
    pub async fn ws_url(&self) -> Result<String, BrowserError> {
        fetch_ws_url(self.port).await
    }

    /// Terminate the browser: SIGTERM, short grace, then SIGKILL.
    pub async fn close(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Some(pid) = self.pid {
            let _ = std::process::Command::new("kill")
                .args(["-TERM", &pid.to_string()])
                .status();
            let deadline = tokio::time::Instant::now() + TERM_GRACE;
            while tokio::time::Instant::now() < deadline {
                if matches!(child.try_wait(), Ok(Some(_))) {
                    debug!(pid, "browser exited on SIGTERM");
                    return;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
        if let Err(e) = child.kill().await {
            warn!(error = %e, "failed to kill browser");
        }
        let _ = child.wait().await;
    }
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// Ask the debugging endpoint for the browser-scoped WebSocket URL.
pub async fn fetch_ws_url(port: u16) -> Result<String, BrowserError> {
    let url = format!("http://127.0.0.1:{port}/json/version");
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| BrowserError::Endpoint(e.to_string()))?;
    let info: VersionInfo = client
        .get(&url)
        .send()
        .await
        .map_err(|e| BrowserError::Endpoint(e.to_string()))?
        .json()
        .await
        .map_err(|e| BrowserError::Endpoint(e.to_string()))?;
    Ok(info.web_socket_debugger_url)
}

/// Locate the browser binary: explicit override first, then well-known
/// names on PATH, then absolute candidates.
fn find_binary() -> Result<PathBuf, BrowserError> {
    if let Some(bin) = env::browser_bin() {
        return Ok(PathBuf::from(bin));
    }
    let path_var = std::env::var("PATH").unwrap_or_default();
    find_in_path(CANDIDATES, &path_var)
        .ok_or_else(|| BrowserError::NotFound(CANDIDATES.join(", ")))
}

fn find_in_path(candidates: &[&str], path_var: &str) -> Option<PathBuf> {
    for candidate in candidates {
        let candidate_path = Path::new(candidate);
        if candidate_path.is_absolute() {
            if candidate_path.exists() {
                return Some(candidate_path.to_path_buf());
            }
            continue;
        }
        for dir in path_var.split(':').filter(|d| !d.is_empty()) {
            let full = Path::new(dir).join(candidate);
            if full.exists() {
                return Some(full);
            }
        }
    }
    None
}

#[cfg(test)]
#[path = "browser_tests.rs"]
mod tests;
