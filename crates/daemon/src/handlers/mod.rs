// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command handlers.
//!
//! Every command that talks to the browser goes through the same two gates:
//! `live_client` asserts the connection exists before any call is attempted,
//! and `guard` classifies call failures — a connection-loss error clears
//! session state and signals shutdown exactly once. There is no implicit
//! recovery at this layer; restarting the daemon is the operator's call.

mod dom;
mod input;
mod nav;
mod net;
mod session;

use std::sync::Arc;
use std::time::Duration;

use bp_core::{ConnectionState, Session};
use bp_wire::{Request, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::cdp::{CdpError, Client};
use crate::state::Ctx;

/// Timeout for an individual protocol call inside a handler.
pub(crate) const DP_TIMEOUT: Duration = Duration::from_secs(30);
/// Default per-command deadline; overridden by a `timeout` param (seconds).
pub(crate) const DEFAULT_COMMAND_TIMEOUT_S: u64 = 60;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("no active session - no page targets attached")]
    NoActiveSession { sessions: Vec<Session> },

    #[error("{message}")]
    User { message: String },

    /// User error carrying a payload (ambiguous matches for client-side
    /// selection).
    #[error("{message}")]
    WithData { message: String, data: serde_json::Value },

    #[error("timeout waiting for {0}")]
    Timeout(String),

    #[error("{0}")]
    Js(String),

    #[error("browser connection lost - daemon shutting down")]
    ConnectionLost,

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Cdp(CdpError),
}

impl HandlerError {
    pub(crate) fn user(message: impl Into<String>) -> Self {
        Self::User { message: message.into() }
    }

    fn into_response(self) -> Response {
        match self {
            Self::NoActiveSession { ref sessions } => {
                let data = serde_json::to_value(sessions).unwrap_or_default();
                Response::err_with_data(self.to_string(), data)
            }
            Self::WithData { message, data } => Response::err_with_data(message, data),
            other => Response::err(other.to_string()),
        }
    }
}

/// Dispatch one request to its handler under the per-command deadline.
pub async fn dispatch(ctx: &Arc<Ctx>, request: &Request) -> Response {
    if request.debug {
        info!(cmd = %request.cmd, params = %request.params, "handling request");
    } else {
        debug!(cmd = %request.cmd, "handling request");
    }

    let timeout_s = request
        .params
        .get("timeout")
        .and_then(|v| v.as_u64())
        .unwrap_or(DEFAULT_COMMAND_TIMEOUT_S)
        .max(1);
    // Small grace over the handler's own waits so their enriched timeout
    // errors win over this blunt one
    let deadline = Duration::from_secs(timeout_s + 5);

    let result = match tokio::time::timeout(deadline, run(ctx, request)).await {
        Ok(result) => result,
        Err(_) => Err(HandlerError::Timeout(format!("command after {timeout_s}s"))),
    };

    match result {
        Ok(data) if data.is_null() => Response::empty(),
        Ok(data) => Response::ok(data),
        Err(e) => {
            debug!(cmd = %request.cmd, error = %e, "request failed");
            e.into_response()
        }
    }
}

async fn run(ctx: &Arc<Ctx>, request: &Request) -> Result<serde_json::Value, HandlerError> {
    let p = &request.params;
    match request.cmd.as_str() {
        "status" => session::status(ctx).await,
        "target" => session::target(ctx, request),
        "clear" => session::clear(ctx, p),
        "reconnect" => session::reconnect(ctx).await,
        "shutdown" => session::shutdown(ctx),

        "console" => net::console(ctx),
        "network" => net::network(ctx).await,
        "cookies" => net::cookies(ctx, p).await,

        "navigate" => nav::navigate(ctx, p).await,
        "reload" => nav::reload(ctx, p).await,
        "back" => nav::history(ctx, p, -1).await,
        "forward" => nav::history(ctx, p, 1).await,
        "ready" => nav::ready(ctx, p).await,

        "eval" => dom::eval(ctx, p).await,
        "html" => dom::html(ctx, p).await,
        "css" => dom::css(ctx, p).await,
        "screenshot" => dom::screenshot(ctx, p).await,

        "click" => input::click(ctx, p).await,
        "focus" => input::focus(ctx, p).await,
        "type" => input::type_text(ctx, p).await,
        "key" => input::key(ctx, p).await,
        "select" => input::select(ctx, p).await,
        "scroll" => input::scroll(ctx, p).await,

        "find" => Err(HandlerError::user(
            "the find command was removed; use 'html --select' instead",
        )),
        other => Err(HandlerError::Unknown(other.to_string())),
    }
}

/// Deserialize handler params, treating null as all-defaults.
pub(crate) fn params<T: DeserializeOwned + Default>(
    value: &serde_json::Value,
) -> Result<T, HandlerError> {
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value.clone()).map_err(|e| HandlerError::InvalidParams(e.to_string()))
}

/// The active session, or a structured error carrying the session list so
/// the caller can pick one.
pub(crate) fn active_session(ctx: &Ctx) -> Result<Session, HandlerError> {
    ctx.sessions
        .active()
        .ok_or_else(|| HandlerError::NoActiveSession { sessions: ctx.sessions.all() })
}

/// Pre-call liveness gate. A missing client or a heartbeat-declared
/// disconnect triggers the fail-fast path before any call is attempted.
pub(crate) fn live_client(ctx: &Arc<Ctx>) -> Result<Arc<Client>, HandlerError> {
    let disconnected = ctx.health.lock().state == ConnectionState::Disconnected;
    match ctx.client() {
        Some(client) if !disconnected => Ok(client),
        _ => {
            ctx.connection_lost();
            Err(HandlerError::ConnectionLost)
        }
    }
}

/// Post-call classification. Connection-loss errors take the fail-fast path
/// unless the supervisor is already mid-reconnection, in which case the
/// caller gets a plain error and the daemon stays up for the recovery.
pub(crate) fn guard<T>(ctx: &Arc<Ctx>, result: Result<T, CdpError>) -> Result<T, HandlerError> {
    result.map_err(|e| {
        if e.is_connection_lost() {
            if ctx.health.lock().state == ConnectionState::Reconnecting {
                return HandlerError::user("browser connection lost - reconnecting");
            }
            ctx.connection_lost();
            HandlerError::ConnectionLost
        } else {
            HandlerError::Cdp(e)
        }
    })
}

/// Caller-provided timeout in seconds, or the command default.
pub(crate) fn wait_timeout(timeout_s: Option<u64>) -> Duration {
    Duration::from_secs(timeout_s.unwrap_or(DEFAULT_COMMAND_TIMEOUT_S).max(1))
}

#[cfg(test)]
pub(crate) mod nav_params_probe {
    #[derive(Debug, Default, serde::Deserialize)]
    #[serde(default)]
    pub struct Probe {
        pub wait: bool,
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
