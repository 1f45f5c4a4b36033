// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observational queries (console, network) and cookie management.

use std::sync::Arc;

use bp_core::time::now_ms;
use serde::Deserialize;
use serde_json::json;

use super::{active_session, guard, live_client, params, HandlerError, DP_TIMEOUT};
use crate::cdp::Client;
use crate::state::Ctx;

pub(super) fn console(ctx: &Arc<Ctx>) -> Result<serde_json::Value, HandlerError> {
    let session = active_session(ctx)?;
    let entries: Vec<_> = ctx
        .console
        .all()
        .into_iter()
        .filter(|e| e.session_id == session.session_id)
        .collect();
    serde_json::to_value(entries).map_err(|e| HandlerError::Internal(e.to_string()))
}

pub(super) async fn network(ctx: &Arc<Ctx>) -> Result<serde_json::Value, HandlerError> {
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;
    ensure_network_enabled(ctx, &client, &session.session_id).await?;
    let entries: Vec<_> = ctx
        .network
        .all()
        .into_iter()
        .filter(|e| e.session_id == session.session_id)
        .collect();
    serde_json::to_value(entries).map_err(|e| HandlerError::Internal(e.to_string()))
}

/// Enable the Network domain for a session on first use.
///
/// Enabling it eagerly at attach would make the browser hold
/// `Runtime.evaluate` replies until network-idle, destroying the latency of
/// html/eval. The cost of laziness: requests issued before the first
/// `network` query for a session are not buffered.
pub(crate) async fn ensure_network_enabled(
    ctx: &Arc<Ctx>,
    client: &Client,
    session_id: &str,
) -> Result<(), HandlerError> {
    if ctx.network_enabled.lock().contains(session_id) {
        return Ok(());
    }
    guard(
        ctx,
        client.send_to_session(session_id, "Network.enable", Some(json!({})), DP_TIMEOUT).await,
    )?;
    ctx.network_enabled.lock().insert(session_id.to_string());
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CookieParams {
    action: String,
    name: String,
    value: String,
    domain: String,
    path: String,
    secure: bool,
    http_only: bool,
    same_site: String,
    max_age: i64,
}

pub(super) async fn cookies(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: CookieParams = params(raw)?;
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;
    let sid = &session.session_id;

    match p.action.as_str() {
        "list" | "" => {
            let cookies = list_cookies(ctx, &client, sid).await?;
            Ok(json!({"cookies": cookies}))
        }
        "set" => {
            if p.name.is_empty() {
                return Err(HandlerError::InvalidParams("cookie name is required".to_string()));
            }
            let mut args = json!({"name": p.name, "value": p.value});
            if p.domain.is_empty() {
                // Scope to the page the active session is on
                args["url"] = json!(session.url);
            } else {
                args["domain"] = json!(p.domain);
            }
            if !p.path.is_empty() {
                args["path"] = json!(p.path);
            }
            if p.secure {
                args["secure"] = json!(true);
            }
            if p.http_only {
                args["httpOnly"] = json!(true);
            }
            if !p.same_site.is_empty() {
                args["sameSite"] = json!(p.same_site);
            }
            if p.max_age > 0 {
                args["expires"] = json!(now_ms() as i64 / 1000 + p.max_age);
            }
            let result = guard(
                ctx,
                client.send_to_session(sid, "Network.setCookie", Some(args), DP_TIMEOUT).await,
            )?;
            if result["success"].as_bool() == Some(false) {
                return Err(HandlerError::user(format!("failed to set cookie '{}'", p.name)));
            }
            Ok(serde_json::Value::Null)
        }
        "delete" => {
            if p.name.is_empty() {
                return Err(HandlerError::InvalidParams("cookie name is required".to_string()));
            }
            let cookies = list_cookies(ctx, &client, sid).await?;
            let matches: Vec<&serde_json::Value> = cookies
                .iter()
                .filter(|c| {
                    c["name"].as_str() == Some(p.name.as_str())
                        && (p.domain.is_empty() || c["domain"].as_str() == Some(p.domain.as_str()))
                })
                .collect();
            match matches.len() {
                // Deleting a cookie that isn't there is success
                0 => Ok(serde_json::Value::Null),
                1 => {
                    let c = matches[0];
                    guard(
                        ctx,
                        client
                            .send_to_session(
                                sid,
                                "Network.deleteCookies",
                                Some(json!({
                                    "name": p.name,
                                    "domain": c["domain"],
                                    "path": c["path"],
                                })),
                                DP_TIMEOUT,
                            )
                            .await,
                    )?;
                    Ok(serde_json::Value::Null)
                }
                n => Err(HandlerError::WithData {
                    message: format!(
                        "cookie '{}' matches {n} entries; pass a domain to disambiguate",
                        p.name
                    ),
                    data: json!(matches),
                }),
            }
        }
        other => Err(HandlerError::InvalidParams(format!(
            "unknown cookie action '{other}' (list, set, delete)"
        ))),
    }
}

async fn list_cookies(
    ctx: &Arc<Ctx>,
    client: &Client,
    session_id: &str,
) -> Result<Vec<serde_json::Value>, HandlerError> {
    let result = guard(
        ctx,
        client.send_to_session(session_id, "Network.getCookies", Some(json!({})), DP_TIMEOUT).await,
    )?;
    Ok(result["cookies"].as_array().cloned().unwrap_or_default())
}
