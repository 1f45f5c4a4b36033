// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection supervisor: heartbeat and reconnection.
//!
//! A periodic `Browser.getVersion` proves the WebSocket alive. On failure
//! the close code decides: a normal/going-away close means the browser shut
//! down on purpose and the daemon follows it down; anything else enters the
//! bounded-backoff reconnection loop. Ring buffers survive reconnection,
//! session state does not — the rebuilt connection re-discovers targets.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use bp_core::time::now_ms;
use bp_core::ConnectionState;
use rand::Rng;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cdp::{CdpError, Client};
use crate::env;
use crate::router;
use crate::state::Ctx;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(5);
const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_FACTOR: f64 = 2.0;
const BACKOFF_CAP: Duration = Duration::from_secs(30);
/// Pause after re-enabling discovery so attachment events can land before
/// session recovery runs.
const SETTLE: Duration = Duration::from_millis(500);
const DISCOVER_TIMEOUT: Duration = Duration::from_secs(10);
const NAVIGATE_TIMEOUT: Duration = Duration::from_secs(15);

pub struct Supervisor {
    ctx: Arc<Ctx>,
    max_attempts: u32,
}

impl Supervisor {
    pub fn new(ctx: Arc<Ctx>) -> Self {
        Self { ctx, max_attempts: env::max_reconnect_attempts() }
    }

    /// Heartbeat loop. Returns when the daemon is shutting down, either
    /// externally or because this loop decided the browser is gone.
    pub async fn run(self) {
        let shutdown = self.ctx.shutdown_token();
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = interval.tick() => {}
            }

            let Some(client) = self.ctx.client() else {
                warn!("heartbeat: no client installed");
                self.ctx.signal_shutdown();
                return;
            };

            match client.send("Browser.getVersion", None, HEARTBEAT_TIMEOUT).await {
                Ok(_) => {
                    self.ctx.health.lock().last_heartbeat_ms = now_ms();
                }
                Err(e) => {
                    warn!(error = %e, code = ?e.close_code(), "heartbeat failed");
                    if is_graceful_close(&e) {
                        info!("browser closed gracefully, shutting down");
                        self.ctx.signal_shutdown();
                        return;
                    }
                    if !self.reconnect().await {
                        return;
                    }
                }
            }
        }
    }

    /// Full reconnection cycle. Returns false when the loop gave up (the
    /// shutdown is already signalled by then).
    async fn reconnect(&self) -> bool {
        let shutdown = self.ctx.shutdown_token();
        {
            let mut health = self.ctx.health.lock();
            health.state = ConnectionState::Reconnecting;
        }
        // Stale events from the dying connection must not repopulate the
        // maps we are about to clear
        self.ctx.reconnecting.store(true, Ordering::SeqCst);
        if let Some(active) = self.ctx.sessions.active() {
            *self.ctx.last_url.lock() = active.url;
        }
        self.ctx.clear_session_state();

        let ctx = Arc::clone(&self.ctx);
        let recovered = run_backoff(self.max_attempts, &shutdown, backoff_delay, move || {
            let ctx = Arc::clone(&ctx);
            async move {
                match try_reconnect(&ctx).await {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        ctx.health.lock().last_error = e.clone();
                        Err(e)
                    }
                }
            }
        })
        .await;

        if recovered {
            let mut health = self.ctx.health.lock();
            health.state = ConnectionState::Connected;
            health.reconnect_count += 1;
            health.last_heartbeat_ms = now_ms();
            health.last_error.clear();
            info!(reconnects = health.reconnect_count, "reconnected to browser");
            true
        } else {
            self.ctx.health.lock().state = ConnectionState::Disconnected;
            warn!("reconnection exhausted, shutting down");
            self.ctx.signal_shutdown();
            false
        }
    }
}

/// Normal (1000) and going-away (1001) closes mean the browser chose to
/// exit; the daemon must not try to resurrect it.
pub(crate) fn is_graceful_close(e: &CdpError) -> bool {
    matches!(e.close_code(), Some(1000) | Some(1001))
}

/// Exponential backoff with ±10% uniform jitter.
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    let raw = BACKOFF_BASE.as_secs_f64() * BACKOFF_FACTOR.powi(attempt.min(16) as i32);
    let capped = raw.min(BACKOFF_CAP.as_secs_f64());
    let jitter = rand::rng().random_range(0.9..=1.1);
    Duration::from_secs_f64(capped * jitter)
}

/// Bounded retry loop: sleep, attempt, repeat. At most `max_attempts`
/// attempts are made; the shutdown token aborts the wait.
pub(crate) async fn run_backoff<F, Fut>(
    max_attempts: u32,
    shutdown: &CancellationToken,
    mut delay_for: impl FnMut(u32) -> Duration,
    mut attempt: F,
) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<(), String>>,
{
    let mut attempts = 0;
    loop {
        if attempts >= max_attempts {
            return false;
        }
        let delay = delay_for(attempts);
        tokio::select! {
            _ = shutdown.cancelled() => return false,
            _ = tokio::time::sleep(delay) => {}
        }
        match attempt().await {
            Ok(()) => return true,
            Err(e) => {
                attempts += 1;
                warn!(attempt = attempts, error = %e, "reconnect attempt failed");
            }
        }
    }
}

/// One reconnection attempt: fresh WebSocket URL (the browser may be a new
/// process on the same port), dial, install the router, swap the client,
/// re-enable discovery, then best-effort session recovery.
pub(crate) async fn try_reconnect(ctx: &Arc<Ctx>) -> Result<(), String> {
    let ws_url = {
        let browser = ctx.browser.lock().await;
        let Some(browser) = browser.as_ref() else {
            return Err("no browser handle".to_string());
        };
        browser.ws_url().await.map_err(|e| e.to_string())?
    };

    let client = Client::dial(&ws_url).await.map_err(|e| e.to_string())?;
    router::install(ctx, &client);
    if let Some(old) = ctx.swap_client(Arc::clone(&client)) {
        // Close after the swap so readers never observe an empty slot
        tokio::spawn(async move { old.close().await });
    }
    // Events from the new client are authoritative
    ctx.reconnecting.store(false, Ordering::SeqCst);

    client
        .send("Target.setDiscoverTargets", Some(json!({"discover": true})), DISCOVER_TIMEOUT)
        .await
        .map_err(|e| e.to_string())?;

    tokio::time::sleep(SETTLE).await;

    let last_url = ctx.last_url.lock().clone();
    if !last_url.is_empty() {
        if let Some(active) = ctx.sessions.active() {
            let _ = client
                .send_to_session(
                    &active.session_id,
                    "Page.navigate",
                    Some(json!({"url": last_url})),
                    NAVIGATE_TIMEOUT,
                )
                .await;
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
