// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console records captured from `Runtime.consoleAPICalled` and
//! `Runtime.exceptionThrown`.

use serde::{Deserialize, Serialize};

/// Console entry severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleKind {
    Log,
    Warn,
    Info,
    Error,
    Debug,
}

impl ConsoleKind {
    /// Map a protocol `type` string onto the canonical set. The protocol
    /// uses "warning" and a long tail of exotic types (dir, table, trace...)
    /// which all collapse to `Log`.
    pub fn from_protocol(kind: &str) -> Self {
        match kind {
            "log" => Self::Log,
            "warning" | "warn" => Self::Warn,
            "info" => Self::Info,
            "error" | "assert" => Self::Error,
            "debug" => Self::Debug,
            _ => Self::Log,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Error => "error",
            Self::Debug => "debug",
        }
    }
}

/// One console message or uncaught exception.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleEntry {
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: ConsoleKind,
    pub text: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    /// Unix-epoch ms, from the event's wallTime when present.
    pub timestamp_ms: u64,
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod tests;
