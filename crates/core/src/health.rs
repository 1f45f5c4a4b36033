// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection health as reported by the heartbeat and the reconnection
//! supervisor.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Reconnecting,
    Disconnected,
}

/// Snapshot included in `status` responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub state: ConnectionState,
    /// Unix-epoch ms of the last successful heartbeat; 0 before the first.
    pub last_heartbeat_ms: u64,
    pub reconnect_count: u32,
    #[serde(default)]
    pub last_error: String,
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self {
            state: ConnectionState::Connected,
            last_heartbeat_ms: 0,
            reconnect_count: 0,
            last_error: String::new(),
        }
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
