// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from the protocol client.
///
/// The WebSocket close code, when one was received, is preserved on the
/// connection-loss variants so the supervisor can distinguish a graceful
/// browser exit from an abnormal drop.
#[derive(Debug, Error)]
pub enum CdpError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("client is closed")]
    Closed { code: Option<u16> },

    #[error("client closed while waiting for response")]
    ClosedWhileWaiting { code: Option<u16> },

    #[error("failed to send request: {0}")]
    Send(String),

    #[error("timeout waiting for {method} response")]
    Timeout { method: String },

    #[error("protocol error {code}: {message}")]
    Protocol { code: i64, message: String },

    #[error("encode error: {0}")]
    Encode(String),
}

impl CdpError {
    /// WebSocket close code, when the connection delivered one before dying.
    pub fn close_code(&self) -> Option<u16> {
        match self {
            Self::Closed { code } | Self::ClosedWhileWaiting { code } => *code,
            _ => None,
        }
    }

    /// True for errors that mean the WebSocket is gone (as opposed to a
    /// browser-side protocol error or a slow response).
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Closed { .. } | Self::ClosedWhileWaiting { .. } | Self::Send(_))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
