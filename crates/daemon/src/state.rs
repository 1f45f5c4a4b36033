// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared daemon context.
//!
//! One `Ctx` is created at startup and shared by the listener, the event
//! router, the supervisor, and every command handler. The protocol client
//! lives in a swappable slot: readers take a brief shared lock to clone the
//! `Arc` and release it before any I/O, so the supervisor can replace the
//! client mid-flight during reconnection.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bp_core::{ConnectionInfo, ConsoleEntry, NetworkEntry, Ring, SessionMap};
use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::browser::Browser;
use crate::cdp::Client;
use crate::nav::NavState;

/// Console ring capacity.
pub const CONSOLE_BUFFER: usize = 1000;
/// Network ring capacity.
pub const NETWORK_BUFFER: usize = 500;

pub struct Ctx {
    pub sessions: SessionMap,
    pub console: Ring<ConsoleEntry>,
    pub network: Ring<NetworkEntry>,
    pub nav: NavState,
    client: RwLock<Option<Arc<Client>>>,
    /// `None` in tests that exercise handlers without a browser.
    pub browser: tokio::sync::Mutex<Option<Browser>>,
    /// Target ids with an attach issued or completed. Guards the race
    /// between `targetCreated` events and the startup enumeration of
    /// pre-existing targets.
    pub attached: Mutex<HashSet<String>>,
    /// Session ids with the Network domain enabled (lazily, on first query).
    pub network_enabled: Mutex<HashSet<String>>,
    pub health: Mutex<ConnectionInfo>,
    /// Set while the supervisor tears down session state; event handlers
    /// skip session-map mutation so stale events don't repopulate it.
    pub reconnecting: AtomicBool,
    /// Active session URL preserved across reconnection for recovery.
    pub last_url: Mutex<String>,
    pub bodies_dir: PathBuf,
    pub start_time: Instant,
    shutdown_fired: AtomicBool,
    shutdown: CancellationToken,
}

impl Ctx {
    pub fn new(bodies_dir: PathBuf) -> Self {
        Self {
            sessions: SessionMap::new(),
            console: Ring::new(CONSOLE_BUFFER),
            network: Ring::new(NETWORK_BUFFER),
            nav: NavState::new(),
            client: RwLock::new(None),
            browser: tokio::sync::Mutex::new(None),
            attached: Mutex::new(HashSet::new()),
            network_enabled: Mutex::new(HashSet::new()),
            health: Mutex::new(ConnectionInfo::default()),
            reconnecting: AtomicBool::new(false),
            last_url: Mutex::new(String::new()),
            bodies_dir,
            start_time: Instant::now(),
            shutdown_fired: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        }
    }

    /// Current protocol client, if one is installed.
    pub fn client(&self) -> Option<Arc<Client>> {
        self.client.read().clone()
    }

    /// Install a client, returning the previous one (closed by the caller
    /// after the swap so readers never observe a gap).
    pub fn swap_client(&self, new: Arc<Client>) -> Option<Arc<Client>> {
        self.client.write().replace(new)
    }

    /// Remove the client on shutdown.
    pub fn take_client(&self) -> Option<Arc<Client>> {
        self.client.write().take()
    }

    /// Token observed by the main loop, the listener, and the supervisor.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Request daemon shutdown. Returns true for the caller that fired it;
    /// every later call is a no-op.
    pub fn signal_shutdown(&self) -> bool {
        if self.shutdown_fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!("shutdown signalled");
        self.shutdown.cancel();
        true
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_fired.load(Ordering::SeqCst)
    }

    /// Drop all per-session state. Ring buffers survive — observational
    /// history stays readable across reconnection.
    pub fn clear_session_state(&self) {
        self.sessions.clear();
        self.attached.lock().clear();
        self.network_enabled.lock().clear();
        self.nav.clear_all();
    }

    /// Fail-fast path for a lost browser: clear session state and request
    /// shutdown exactly once. Returns true for the first observer.
    pub fn connection_lost(&self) -> bool {
        self.clear_session_state();
        self.signal_shutdown()
    }

    /// Most recent Document-type HTTP status observed for a session.
    pub fn doc_status_for(&self, session_id: &str) -> Option<i64> {
        self.network
            .all()
            .into_iter()
            .rev()
            .find(|e| {
                e.session_id == session_id && e.resource_type == "Document" && e.status != 0
            })
            .map(|e| e.status)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
