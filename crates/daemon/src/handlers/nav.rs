// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Navigation commands and the readiness poll.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use super::dom::eval_on;
use super::net::ensure_network_enabled;
use super::{active_session, guard, live_client, params, wait_timeout, HandlerError, DP_TIMEOUT};
use crate::cdp::Client;
use crate::state::Ctx;

const TITLE_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Continuous quiet period required by the network-idle readiness mode.
const IDLE_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NavigateParams {
    url: String,
    wait: bool,
    timeout: Option<u64>,
}

pub(super) async fn navigate(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: NavigateParams = params(raw)?;
    if p.url.is_empty() {
        return Err(HandlerError::InvalidParams("url is required".to_string()));
    }
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;
    let sid = session.session_id.as_str();

    // Marker first, then the (optional) waiter, then the command — a cached
    // page can commit before Page.navigate even returns
    ctx.nav.begin_navigation(sid);
    let load_rx = if p.wait { Some(ctx.nav.register_load_waiter(sid)) } else { None };

    let result = guard(
        ctx,
        client
            .send_to_session(sid, "Page.navigate", Some(json!({"url": p.url})), DP_TIMEOUT)
            .await,
    );
    let result = match result {
        Ok(result) => result,
        Err(e) => {
            ctx.nav.finish_navigation(sid);
            ctx.nav.clear_load_waiter(sid);
            return Err(e);
        }
    };
    if let Some(error_text) = result.get("errorText").and_then(|v| v.as_str()) {
        if !error_text.is_empty() {
            ctx.nav.finish_navigation(sid);
            ctx.nav.clear_load_waiter(sid);
            return Err(HandlerError::user(format!("navigation failed: {error_text}")));
        }
    }

    if let Some(rx) = load_rx {
        // Double-check: absence of the marker means the navigation already
        // committed and the load event may have fired before we could wait
        if ctx.nav.is_navigating(sid) {
            match tokio::time::timeout(wait_timeout(p.timeout), rx).await {
                Ok(_) => {}
                Err(_) => {
                    ctx.nav.clear_load_waiter(sid);
                    return Err(HandlerError::Timeout(format!("navigation to {}", p.url)));
                }
            }
        } else {
            ctx.nav.clear_load_waiter(sid);
        }
    }

    ctx.sessions.update(sid, &p.url, "");
    let title = fetch_title(ctx, &client, sid).await;
    ctx.sessions.update(sid, "", &title);
    let url = ctx.sessions.get(sid).map(|s| s.url).unwrap_or(p.url);
    Ok(json!({"url": url, "title": title}))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ReloadParams {
    ignore_cache: bool,
    wait: bool,
    timeout: Option<u64>,
}

pub(super) async fn reload(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: ReloadParams = params(raw)?;
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;
    let sid = session.session_id.as_str();

    ctx.nav.begin_navigation(sid);
    let load_rx = if p.wait { Some(ctx.nav.register_load_waiter(sid)) } else { None };

    let result = guard(
        ctx,
        client
            .send_to_session(
                sid,
                "Page.reload",
                Some(json!({"ignoreCache": p.ignore_cache})),
                DP_TIMEOUT,
            )
            .await,
    );
    if let Err(e) = result {
        ctx.nav.finish_navigation(sid);
        ctx.nav.clear_load_waiter(sid);
        return Err(e);
    }

    if let Some(rx) = load_rx {
        if ctx.nav.is_navigating(sid) {
            match tokio::time::timeout(wait_timeout(p.timeout), rx).await {
                Ok(_) => {}
                Err(_) => {
                    ctx.nav.clear_load_waiter(sid);
                    return Err(HandlerError::Timeout(format!("reload of {}", session.url)));
                }
            }
        } else {
            ctx.nav.clear_load_waiter(sid);
        }
    }

    let title = fetch_title(ctx, &client, sid).await;
    ctx.sessions.update(sid, "", &title);
    let url = ctx.sessions.get(sid).map(|s| s.url).unwrap_or(session.url);
    Ok(json!({"url": url, "title": title}))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistoryParams {
    wait: bool,
    timeout: Option<u64>,
}

/// Shared implementation of `back` (delta -1) and `forward` (delta +1).
///
/// History navigation waits on `frameNavigated`, not `loadEventFired`: a
/// BFCache restore never fires the load event. The waiter is registered
/// before the command because a cache hit can commit near-instantly.
pub(super) async fn history(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
    delta: i64,
) -> Result<serde_json::Value, HandlerError> {
    let p: HistoryParams = params(raw)?;
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;
    let sid = session.session_id.as_str();

    let history = guard(
        ctx,
        client.send_to_session(sid, "Page.getNavigationHistory", Some(json!({})), DP_TIMEOUT).await,
    )?;
    let current = history["currentIndex"].as_i64().unwrap_or(0);
    let entries = history["entries"].as_array().cloned().unwrap_or_default();
    let index = current + delta;
    if index < 0 {
        return Err(HandlerError::user("no previous page"));
    }
    if index >= entries.len() as i64 {
        return Err(HandlerError::user("no next page"));
    }
    let entry = &entries[index as usize];
    let entry_id = entry["id"].as_i64().unwrap_or(0);
    let entry_url = entry["url"].as_str().unwrap_or_default().to_string();
    let entry_title = entry["title"].as_str().unwrap_or_default().to_string();

    let mut rx = ctx.nav.register_nav_waiter(sid);
    let send = guard(
        ctx,
        client
            .send_to_session(
                sid,
                "Page.navigateToHistoryEntry",
                Some(json!({"entryId": entry_id})),
                DP_TIMEOUT,
            )
            .await,
    );
    if let Err(e) = send {
        ctx.nav.clear_nav_waiter(sid);
        return Err(e);
    }

    if p.wait {
        match tokio::time::timeout(wait_timeout(p.timeout), rx.recv()).await {
            Ok(Some(nav)) => {
                ctx.sessions.update(sid, &nav.url, &nav.title);
                Ok(json!({"url": nav.url, "title": nav.title}))
            }
            Ok(None) => {
                // Waiter dropped (reconnection) — fall back to history data
                ctx.sessions.update(sid, &entry_url, &entry_title);
                Ok(json!({"url": entry_url, "title": entry_title}))
            }
            Err(_) => {
                ctx.nav.clear_nav_waiter(sid);
                Err(HandlerError::Timeout(format!("navigation to {entry_url}")))
            }
        }
    } else {
        ctx.nav.clear_nav_waiter(sid);
        ctx.sessions.update(sid, &entry_url, &entry_title);
        Ok(json!({"url": entry_url, "title": entry_title}))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ReadyParams {
    selector: String,
    eval: String,
    network_idle: bool,
    timeout: Option<u64>,
}

/// Wait until the page is "ready" by one of four definitions, in priority
/// order: network idle, eval truthiness, selector presence, page load.
pub(super) async fn ready(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: ReadyParams = params(raw)?;
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;
    let sid = session.session_id.as_str();
    let deadline = tokio::time::Instant::now() + wait_timeout(p.timeout);

    if p.network_idle {
        ensure_network_enabled(ctx, &client, sid).await?;
        let mut quiet_since: Option<tokio::time::Instant> = None;
        loop {
            let pending = ctx
                .network
                .all()
                .iter()
                .filter(|e| e.session_id == sid && e.is_pending())
                .count();
            if pending == 0 {
                let since = *quiet_since.get_or_insert_with(tokio::time::Instant::now);
                if since.elapsed() >= IDLE_WINDOW {
                    return Ok(serde_json::Value::Null);
                }
            } else {
                quiet_since = None;
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(HandlerError::Timeout("network idle".to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    if !p.eval.is_empty() {
        loop {
            let result = eval_on(ctx, &client, sid, &p.eval, DP_TIMEOUT).await;
            if let Ok(value) = result {
                if is_truthy(&value) {
                    return Ok(serde_json::Value::Null);
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(HandlerError::Timeout(format!("expression to be truthy: {}", p.eval)));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    if !p.selector.is_empty() {
        loop {
            if query_selector(ctx, &client, sid, &p.selector).await?.is_some() {
                return Ok(serde_json::Value::Null);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(HandlerError::Timeout(format!("selector {}", p.selector)));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    // Default: page load
    let state = eval_on(ctx, &client, sid, "document.readyState", DP_TIMEOUT).await?;
    if state["value"].as_str() == Some("complete") {
        return Ok(serde_json::Value::Null);
    }
    let rx = ctx.nav.register_load_waiter(sid);
    // Re-check after registering: the load can complete in the gap
    let state = eval_on(ctx, &client, sid, "document.readyState", DP_TIMEOUT).await?;
    if state["value"].as_str() == Some("complete") {
        ctx.nav.clear_load_waiter(sid);
        return Ok(serde_json::Value::Null);
    }
    match tokio::time::timeout_at(deadline, rx).await {
        Ok(_) => Ok(serde_json::Value::Null),
        Err(_) => {
            ctx.nav.clear_load_waiter(sid);
            Err(HandlerError::Timeout("page load".to_string()))
        }
    }
}

fn is_truthy(result: &serde_json::Value) -> bool {
    match &result["value"] {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Null => false,
        _ => true,
    }
}

/// `DOM.querySelector` against the current document root. Returns the node
/// id when the selector matches. Also used by the `css matched` path.
pub(super) async fn query_selector(
    ctx: &Arc<Ctx>,
    client: &Client,
    session_id: &str,
    selector: &str,
) -> Result<Option<i64>, HandlerError> {
    let doc = guard(
        ctx,
        client
            .send_to_session(session_id, "DOM.getDocument", Some(json!({"depth": 0})), DP_TIMEOUT)
            .await,
    )?;
    let root_id = doc["root"]["nodeId"].as_i64().unwrap_or(0);
    let found = guard(
        ctx,
        client
            .send_to_session(
                session_id,
                "DOM.querySelector",
                Some(json!({"nodeId": root_id, "selector": selector})),
                DP_TIMEOUT,
            )
            .await,
    )?;
    match found["nodeId"].as_i64() {
        Some(id) if id != 0 => Ok(Some(id)),
        _ => Ok(None),
    }
}

/// Best-effort page title, for command results and the session registry.
pub(super) async fn fetch_title(ctx: &Arc<Ctx>, client: &Client, session_id: &str) -> String {
    eval_on(ctx, client, session_id, "document.title", TITLE_TIMEOUT)
        .await
        .ok()
        .and_then(|r| r["value"].as_str().map(str::to_string))
        .unwrap_or_default()
}
