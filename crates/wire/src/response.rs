// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Response from daemon to CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Success with a payload.
    pub fn ok(data: serde_json::Value) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }

    /// Success with no payload.
    pub fn empty() -> Self {
        Self { ok: true, data: None, error: None }
    }

    /// Failure with a message.
    pub fn err(message: impl Into<String>) -> Self {
        Self { ok: false, data: None, error: Some(message.into()) }
    }

    /// Failure with a message and a payload (e.g. ambiguous matches the
    /// client can present for selection).
    pub fn err_with_data(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self { ok: false, data: Some(data), error: Some(message.into()) }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
