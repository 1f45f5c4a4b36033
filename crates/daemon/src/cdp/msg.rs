// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Outbound request frame.
#[derive(Debug, Serialize)]
pub(super) struct OutgoingRequest<'a> {
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<&'a serde_json::Value>,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Any inbound frame: a response (has `id`) or an event (has `method`).
#[derive(Debug, Deserialize)]
pub(super) struct Incoming {
    pub id: Option<u64>,
    pub method: Option<String>,
    #[serde(default)]
    pub params: serde_json::Value,
    pub result: Option<serde_json::Value>,
    pub error: Option<ProtocolErrorPayload>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Error payload attached to a failed response.
#[derive(Debug, Deserialize)]
pub(super) struct ProtocolErrorPayload {
    pub code: i64,
    pub message: String,
}

/// An unsolicited event delivered to subscribers.
#[derive(Debug, Clone)]
pub struct CdpEvent {
    pub method: String,
    pub params: serde_json::Value,
    /// Session the event belongs to; `None` for browser-scoped events.
    pub session_id: Option<String>,
}

#[cfg(test)]
#[path = "msg_tests.rs"]
mod tests;
