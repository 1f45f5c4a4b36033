// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed payloads for the `status` and `target` responses.
//!
//! Other commands return ad-hoc JSON; these two are typed because the CLI
//! renders them as structured tables and the REPL prompt reads them.

use bp_core::{ConnectionInfo, Session};
use serde::{Deserialize, Serialize};

/// One session enriched with the most recent Document HTTP status observed
/// in the network buffer (best-effort; absent before the first navigation
/// with the Network domain enabled).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    #[serde(flatten)]
    pub session: Session,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<i64>,
}

/// Payload of a `status` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    pub running: bool,
    pub pid: u32,
    /// Browser process id, when the browser is alive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_pid: Option<u32>,
    pub sessions: Vec<SessionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_session: Option<Session>,
    pub connection: ConnectionInfo,
}

/// Payload of a `target` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_session: Option<Session>,
    pub sessions: Vec<Session>,
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
