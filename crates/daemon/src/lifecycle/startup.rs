// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use serde_json::json;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::browser::Browser;
use crate::cdp::Client;
use crate::router;
use crate::state::Ctx;

use super::{Config, DaemonState, LifecycleError};

const DISCOVER_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of daemon startup - includes both the daemon state and the
/// listener socket to spawn as a task.
pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
}

/// Start the daemon.
///
/// Ordering matters: the lock comes first so a second daemon fails before
/// touching anything, the browser and protocol client come next, and the
/// socket binds last so clients can't reach a half-initialized daemon.
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock —
            // those files belong to the already-running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. Create state directory, user-only
    if !config.state_dir.exists() {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new().recursive(true).mode(0o700).create(&config.state_dir)?;
    }

    // 2. Acquire lock file FIRST - prevents races
    let lock_file = acquire_lock(&config.lock_path)?;

    // 3. Write version file
    std::fs::write(&config.version_path, crate::env::PROTOCOL_VERSION)?;

    // 4. Launch the browser and dial its debugging socket
    let browser = Browser::launch(&config.state_dir).await?;
    let ws_url = browser.ws_url().await?;
    let client = Client::dial(&ws_url).await?;

    // 5. Build the shared context and install the event router
    let ctx = Arc::new(Ctx::new(config.bodies_dir.clone()));
    *ctx.browser.lock().await = Some(browser);
    router::install(&ctx, &client);
    ctx.swap_client(Arc::clone(&client));

    // 6. Discover targets. Existing pages are enumerated explicitly because
    // targetCreated only fires for targets created after discovery starts;
    // the attach mark in the router dedups the overlap.
    client
        .send("Target.setDiscoverTargets", Some(json!({"discover": true})), DISCOVER_TIMEOUT)
        .await?;
    match client.send("Target.getTargets", None, DISCOVER_TIMEOUT).await {
        Ok(result) => {
            for target in result["targetInfos"].as_array().into_iter().flatten() {
                if target["type"].as_str() == Some("page") {
                    if let Some(target_id) = target["targetId"].as_str() {
                        router::attach_target(&ctx, target_id.to_string());
                    }
                }
            }
        }
        Err(e) => warn!(error = %e, "target enumeration failed"),
    }

    // 7. Remove stale socket and bind (LAST - only after everything works)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!("Daemon started");

    Ok(StartupResult { daemon: DaemonState::new(config.clone(), lock_file, ctx), listener })
}

/// Take the exclusive PID-file lock and record our pid.
///
/// OpenOptions avoids truncating before the lock is held, which would wipe
/// the running daemon's PID.
pub(super) fn acquire_lock(path: &std::path::Path) -> Result<std::fs::File, LifecycleError> {
    use std::os::unix::fs::OpenOptionsExt;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .mode(0o600)
        .open(path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    for path in [&config.socket_path, &config.version_path, &config.lock_path] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
