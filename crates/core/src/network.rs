// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network records assembled from the `Network.*` event stream.
//!
//! An entry is created by `requestWillBeSent` and then mutated in place by
//! `responseReceived` / `loadingFinished` / `loadingFailed` for the same
//! request id. The event router performs those mutations through the ring
//! buffer's newest-first `update`.

use serde::{Deserialize, Serialize};

/// One observed network request and (eventually) its response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkEntry {
    pub session_id: String,
    pub request_id: String,
    pub url: String,
    pub method: String,
    /// Resource type reported by the browser (Document, XHR, Image, ...).
    #[serde(rename = "type")]
    pub resource_type: String,
    pub request_headers: serde_json::Map<String, serde_json::Value>,
    /// Unix-epoch ms, always derived from the event's wallTime.
    pub request_time_ms: f64,
    pub status: i64,
    pub status_text: String,
    pub mime_type: String,
    pub response_headers: serde_json::Map<String, serde_json::Value>,
    pub response_time_ms: f64,
    pub duration_s: f64,
    pub size: f64,
    /// Response body when textual; empty for binary bodies.
    pub body: String,
    /// File path of a persisted binary body, when applicable.
    pub body_path: String,
    pub failed: bool,
    pub error: String,
}

impl NetworkEntry {
    /// A request that has neither completed nor failed yet. Used by the
    /// network-idle readiness poll.
    pub fn is_pending(&self) -> bool {
        self.status == 0 && self.response_time_ms == 0.0 && !self.failed
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
