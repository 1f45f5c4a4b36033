// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level commands: status, target selection, buffer clearing,
//! manual reconnect, shutdown.

use std::sync::Arc;

use bp_core::ConnectionState;
use bp_core::time::now_ms;
use bp_wire::{Request, SessionStatus, StatusData, TargetData};
use serde::Deserialize;
use serde_json::json;

use super::HandlerError;
use crate::bodies;
use crate::state::Ctx;
use crate::supervisor;

pub(super) async fn status(ctx: &Arc<Ctx>) -> Result<serde_json::Value, HandlerError> {
    let sessions = ctx
        .sessions
        .all()
        .into_iter()
        .map(|s| SessionStatus { http_status: ctx.doc_status_for(&s.session_id), session: s })
        .collect();
    let browser_pid = ctx.browser.lock().await.as_ref().and_then(|b| b.pid());
    let data = StatusData {
        running: true,
        pid: std::process::id(),
        browser_pid,
        sessions,
        active_session: ctx.sessions.active(),
        connection: ctx.health.lock().clone(),
    };
    serde_json::to_value(data).map_err(|e| HandlerError::Internal(e.to_string()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TargetParams {
    query: String,
}

pub(super) fn target(ctx: &Arc<Ctx>, request: &Request) -> Result<serde_json::Value, HandlerError> {
    let query = match &request.target {
        Some(t) if !t.is_empty() => t.clone(),
        _ => super::params::<TargetParams>(&request.params)?.query,
    };

    if query.is_empty() {
        return target_data(ctx);
    }

    let matches = ctx.sessions.find_by_query(&query);
    match matches.len() {
        0 => Err(HandlerError::user(format!("no session matches '{query}'"))),
        1 => {
            ctx.sessions.set_active(&matches[0].session_id);
            target_data(ctx)
        }
        n => Err(HandlerError::WithData {
            message: format!("ambiguous target '{query}' ({n} matches)"),
            data: serde_json::to_value(matches).unwrap_or_default(),
        }),
    }
}

fn target_data(ctx: &Arc<Ctx>) -> Result<serde_json::Value, HandlerError> {
    let data = TargetData { active_session: ctx.sessions.active(), sessions: ctx.sessions.all() };
    serde_json::to_value(data).map_err(|e| HandlerError::Internal(e.to_string()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClearParams {
    what: String,
}

pub(super) fn clear(
    ctx: &Arc<Ctx>,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: ClearParams = super::params(params)?;
    match p.what.as_str() {
        "console" => ctx.console.clear(),
        "network" => clear_network(ctx),
        "all" | "" => {
            ctx.console.clear();
            clear_network(ctx);
        }
        other => {
            return Err(HandlerError::InvalidParams(format!(
                "unknown buffer '{other}' (console, network, all)"
            )))
        }
    }
    Ok(serde_json::Value::Null)
}

fn clear_network(ctx: &Arc<Ctx>) {
    ctx.network.clear();
    if let Err(e) = bodies::clear(&ctx.bodies_dir) {
        tracing::warn!(error = %e, "failed to clear body files");
    }
}

pub(super) async fn reconnect(ctx: &Arc<Ctx>) -> Result<serde_json::Value, HandlerError> {
    let state = ctx.health.lock().state;
    match state {
        ConnectionState::Connected => {
            Ok(json!({"state": "connected", "message": "already connected"}))
        }
        ConnectionState::Reconnecting => {
            let health = ctx.health.lock().clone();
            Ok(json!({"state": "reconnecting", "lastError": health.last_error}))
        }
        ConnectionState::Disconnected => match supervisor::try_reconnect(ctx).await {
            Ok(()) => {
                let mut health = ctx.health.lock();
                health.state = ConnectionState::Connected;
                health.reconnect_count += 1;
                health.last_heartbeat_ms = now_ms();
                health.last_error.clear();
                Ok(json!({"state": "connected"}))
            }
            Err(e) => Err(HandlerError::user(format!("reconnect failed: {e}"))),
        },
    }
}

pub(super) fn shutdown(ctx: &Arc<Ctx>) -> Result<serde_json::Value, HandlerError> {
    // Acknowledge before the shutdown completes; the listener writes this
    // response and then the daemon tears down
    ctx.signal_shutdown();
    Ok(json!({"shuttingDown": true}))
}
