// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Navigation waiter tables.
//!
//! Two races are designed around here:
//!
//! 1. Fast-path: a navigation to a cached page can fire its lifecycle events
//!    before the command handler finishes registering a waiter. The
//!    `navigating` marker is created *before* `Page.navigate` is issued and
//!    waiters re-check it after registering — absence means the navigation
//!    already committed and there is nothing to wait for.
//! 2. BFCache: history navigation restoring a cached page never fires
//!    `loadEventFired`, so history commands wait on `frameNavigated` through
//!    a capacity-1 channel — a signal delivered just before the receive is
//!    buffered, not lost.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, Notify};

/// Delivered to a history-navigation waiter on `frameNavigated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavResult {
    pub url: String,
    pub title: String,
}

/// Per-session waiter tables. All maps are keyed by session id.
#[derive(Default)]
pub struct NavState {
    navigating: Mutex<HashMap<String, std::sync::Arc<Notify>>>,
    load_waiters: Mutex<HashMap<String, oneshot::Sender<()>>>,
    nav_waiters: Mutex<HashMap<String, mpsc::Sender<NavResult>>>,
}

impl NavState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a navigation as in flight. A prior marker for the session is
    /// closed first so rapid re-navigation never strands a waiter.
    pub fn begin_navigation(&self, session_id: &str) {
        let mut g = self.navigating.lock();
        if let Some(prior) = g.remove(session_id) {
            prior.notify_waiters();
        }
        g.insert(session_id.to_string(), std::sync::Arc::new(Notify::new()));
    }

    /// Whether a navigation is still uncommitted for the session.
    pub fn is_navigating(&self, session_id: &str) -> bool {
        self.navigating.lock().contains_key(session_id)
    }

    /// Close-and-delete the navigation marker. Idempotent; called on the
    /// first lifecycle event that proves commit.
    pub fn finish_navigation(&self, session_id: &str) {
        if let Some(marker) = self.navigating.lock().remove(session_id) {
            marker.notify_waiters();
        }
    }

    /// Register a single-shot load waiter. Replaces any prior waiter.
    pub fn register_load_waiter(&self, session_id: &str) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.load_waiters.lock().insert(session_id.to_string(), tx);
        rx
    }

    /// Deliver the load signal, consuming the waiter.
    pub fn signal_load(&self, session_id: &str) {
        if let Some(tx) = self.load_waiters.lock().remove(session_id) {
            let _ = tx.send(());
        }
    }

    /// Drop a load waiter that timed out.
    pub fn clear_load_waiter(&self, session_id: &str) {
        self.load_waiters.lock().remove(session_id);
    }

    /// Register a history-navigation waiter. The channel is buffered (cap 1)
    /// so a `frameNavigated` arriving before the receive is not lost.
    pub fn register_nav_waiter(&self, session_id: &str) -> mpsc::Receiver<NavResult> {
        let (tx, rx) = mpsc::channel(1);
        self.nav_waiters.lock().insert(session_id.to_string(), tx);
        rx
    }

    /// Deliver a navigation result, consuming the waiter. A second delivery
    /// for the same registration is dropped.
    pub fn signal_nav(&self, session_id: &str, result: NavResult) {
        if let Some(tx) = self.nav_waiters.lock().remove(session_id) {
            let _ = tx.try_send(result);
        }
    }

    /// Whether a history-navigation waiter is registered for the session.
    pub fn has_nav_waiter(&self, session_id: &str) -> bool {
        self.nav_waiters.lock().contains_key(session_id)
    }

    /// Drop a history waiter that timed out.
    pub fn clear_nav_waiter(&self, session_id: &str) {
        self.nav_waiters.lock().remove(session_id);
    }

    /// Drop every waiter and marker. Used during reconnection.
    pub fn clear_all(&self) {
        for (_, marker) in self.navigating.lock().drain() {
            marker.notify_waiters();
        }
        self.load_waiters.lock().clear();
        self.nav_waiters.lock().clear();
    }
}

#[cfg(test)]
#[path = "nav_tests.rs"]
mod tests;
