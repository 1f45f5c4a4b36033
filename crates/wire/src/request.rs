// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Request from CLI to daemon.
///
/// `cmd` is one of the CLI verbs (navigate, eval, html, ...). `params` is a
/// per-command JSON object; unknown commands and malformed params are
/// rejected by the daemon's dispatcher, never at the framing layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub cmd: String,
    /// Optional target session query (used by `target`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub params: serde_json::Value,
    /// Echo request handling details in the daemon log.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub debug: bool,
}

impl Request {
    /// A request with no parameters.
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into(), target: None, params: serde_json::Value::Null, debug: false }
    }

    /// A request with a params object.
    pub fn with_params(cmd: impl Into<String>, params: serde_json::Value) -> Self {
        Self { cmd: cmd.into(), target: None, params, debug: false }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
