// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session registry: attached browser tabs and the active selection.
//!
//! A session is an attached control channel to one page target. Exactly one
//! session is active at a time; it is the implicit addressee of commands that
//! don't name a target. The registry keeps attachment order so that removing
//! the active session falls back to the most recently attached survivor.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// One attached page target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub target_id: String,
    pub url: String,
    pub title: String,
}

#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<String, Session>,
    /// Session ids in attachment order.
    order: Vec<String>,
    /// Active session id; empty iff no sessions exist.
    active: String,
}

/// Thread-safe session registry.
#[derive(Debug, Default)]
pub struct SessionMap {
    inner: RwLock<Inner>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly attached session. The first session added becomes
    /// active. Re-adding an existing id updates it in place.
    pub fn add(&self, session_id: &str, target_id: &str, url: &str, title: &str) {
        let mut g = self.inner.write();
        if !g.sessions.contains_key(session_id) {
            g.order.push(session_id.to_string());
        }
        g.sessions.insert(
            session_id.to_string(),
            Session {
                session_id: session_id.to_string(),
                target_id: target_id.to_string(),
                url: url.to_string(),
                title: title.to_string(),
            },
        );
        if g.active.is_empty() {
            g.active = session_id.to_string();
        }
    }

    /// Remove a session. If it was active, the most recently attached
    /// survivor becomes active (or the active id is cleared). Returns the
    /// new active id and whether the active selection changed.
    pub fn remove(&self, session_id: &str) -> (String, bool) {
        let mut g = self.inner.write();
        if g.sessions.remove(session_id).is_none() {
            return (g.active.clone(), false);
        }
        g.order.retain(|id| id.as_str() != session_id);
        if g.active == session_id {
            g.active = g.order.last().cloned().unwrap_or_default();
            (g.active.clone(), true)
        } else {
            (g.active.clone(), false)
        }
    }

    /// Select the active session. Returns false for unknown ids.
    pub fn set_active(&self, session_id: &str) -> bool {
        let mut g = self.inner.write();
        if g.sessions.contains_key(session_id) {
            g.active = session_id.to_string();
            true
        } else {
            false
        }
    }

    /// Update url/title of a session. Empty strings leave the existing value.
    pub fn update(&self, session_id: &str, url: &str, title: &str) {
        let mut g = self.inner.write();
        if let Some(s) = g.sessions.get_mut(session_id) {
            if !url.is_empty() {
                s.url = url.to_string();
            }
            if !title.is_empty() {
                s.title = title.to_string();
            }
        }
    }

    /// Update url/title of the session attached to a target, if any.
    pub fn update_by_target(&self, target_id: &str, url: &str, title: &str) {
        let mut g = self.inner.write();
        if let Some(s) = g.sessions.values_mut().find(|s| s.target_id == target_id) {
            if !url.is_empty() {
                s.url = url.to_string();
            }
            if !title.is_empty() {
                s.title = title.to_string();
            }
        }
    }

    /// Match sessions against a query: session-id prefix first
    /// (case-sensitive), then case-insensitive title substring.
    /// Disambiguation among multiple matches is the caller's concern.
    pub fn find_by_query(&self, query: &str) -> Vec<Session> {
        let g = self.inner.read();
        let by_prefix: Vec<Session> = g
            .order
            .iter()
            .filter(|id| id.starts_with(query))
            .filter_map(|id| g.sessions.get(id).cloned())
            .collect();
        if !by_prefix.is_empty() {
            return by_prefix;
        }
        let needle = query.to_lowercase();
        g.order
            .iter()
            .filter_map(|id| g.sessions.get(id))
            .filter(|s| s.title.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// All sessions in attachment order.
    pub fn all(&self) -> Vec<Session> {
        let g = self.inner.read();
        g.order.iter().filter_map(|id| g.sessions.get(id).cloned()).collect()
    }

    /// Look up one session by id.
    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.inner.read().sessions.get(session_id).cloned()
    }

    /// The active session, if any.
    pub fn active(&self) -> Option<Session> {
        let g = self.inner.read();
        g.sessions.get(&g.active).cloned()
    }

    /// The active session id; empty when no sessions exist.
    pub fn active_id(&self) -> String {
        self.inner.read().active.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything. Used while the connection supervisor rebuilds
    /// attachment state during reconnection.
    pub fn clear(&self) {
        let mut g = self.inner.write();
        g.sessions.clear();
        g.order.clear();
        g.active.clear();
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
