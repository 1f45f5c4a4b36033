// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event router: translates protocol events into daemon state.
//!
//! Every handler here runs synchronously on the client's read task and must
//! not block — any follow-up protocol call (attach, domain enables, body
//! fetch, title fetch) is spawned, because its response would arrive on the
//! very read loop the handler is holding.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use bp_core::time::now_ms;
use bp_core::{ConsoleEntry, ConsoleKind, NetworkEntry};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::bodies;
use crate::cdp::{CdpEvent, Client};
use crate::nav::NavResult;
use crate::state::Ctx;

const ATTACH_TIMEOUT: Duration = Duration::from_secs(10);
const ENABLE_TIMEOUT: Duration = Duration::from_secs(10);
const BODY_TIMEOUT: Duration = Duration::from_secs(15);
const TITLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Methods the router subscribes to.
const METHODS: &[&str] = &[
    "Target.targetCreated",
    "Target.attachedToTarget",
    "Target.detachedFromTarget",
    "Target.targetInfoChanged",
    "Runtime.consoleAPICalled",
    "Runtime.exceptionThrown",
    "Network.requestWillBeSent",
    "Network.responseReceived",
    "Network.loadingFinished",
    "Network.loadingFailed",
    "Page.frameNavigated",
    "Page.loadEventFired",
    "Page.domContentEventFired",
];

/// Subscribe the router on a (new) client. Subscribers hold a weak context
/// reference so the client does not keep the daemon alive.
pub fn install(ctx: &Arc<Ctx>, client: &Client) {
    for method in METHODS {
        let weak = Arc::downgrade(ctx);
        client.subscribe(method, move |event| {
            if let Some(ctx) = weak.upgrade() {
                handle(&ctx, event);
            }
        });
    }
}

/// Route one event. Split out from `install` so tests can drive the router
/// with synthetic events.
pub(crate) fn handle(ctx: &Arc<Ctx>, event: &CdpEvent) {
    match event.method.as_str() {
        "Target.targetCreated" => on_target_created(ctx, event),
        "Target.attachedToTarget" => on_attached(ctx, event),
        "Target.detachedFromTarget" => on_detached(ctx, event),
        "Target.targetInfoChanged" => on_target_info_changed(ctx, event),
        "Runtime.consoleAPICalled" => on_console(ctx, event),
        "Runtime.exceptionThrown" => on_exception(ctx, event),
        "Network.requestWillBeSent" => on_request_will_be_sent(ctx, event),
        "Network.responseReceived" => on_response_received(ctx, event),
        "Network.loadingFinished" => on_loading_finished(ctx, event),
        "Network.loadingFailed" => on_loading_failed(ctx, event),
        "Page.frameNavigated" => on_frame_navigated(ctx, event),
        "Page.loadEventFired" => on_load_event(ctx, event),
        "Page.domContentEventFired" => on_dom_content_event(ctx, event),
        _ => {}
    }
}

fn parse<T: serde::de::DeserializeOwned>(event: &CdpEvent) -> Option<T> {
    match serde_json::from_value(event.params.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!(method = %event.method, error = %e, "unparseable event params");
            None
        }
    }
}

// ---- Targets ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetInfo {
    target_id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetCreatedParams {
    target_info: TargetInfo,
}

fn on_target_created(ctx: &Arc<Ctx>, event: &CdpEvent) {
    let Some(p) = parse::<TargetCreatedParams>(event) else { return };
    if p.target_info.kind != "page" {
        return;
    }
    attach_target(ctx, p.target_info.target_id);
}

/// Issue an attach for a page target, once. The mark-then-attach order makes
/// a `targetCreated` event racing the startup `Target.getTargets`
/// enumeration harmless: whoever marks first attaches, the other skips.
pub(crate) fn attach_target(ctx: &Arc<Ctx>, target_id: String) {
    if !ctx.attached.lock().insert(target_id.clone()) {
        return;
    }
    let Some(client) = ctx.client() else {
        ctx.attached.lock().remove(&target_id);
        return;
    };
    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        let result = client
            .send(
                "Target.attachToTarget",
                Some(json!({"targetId": target_id, "flatten": true})),
                ATTACH_TIMEOUT,
            )
            .await;
        if let Err(e) = result {
            // Clear the mark so a later targetCreated can retry
            warn!(target_id = %target_id, error = %e, "attach failed");
            ctx.attached.lock().remove(&target_id);
        }
    });
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachedParams {
    session_id: String,
    target_info: TargetInfo,
}

fn on_attached(ctx: &Arc<Ctx>, event: &CdpEvent) {
    let Some(p) = parse::<AttachedParams>(event) else { return };
    if p.target_info.kind != "page" {
        return;
    }
    if ctx.reconnecting.load(std::sync::atomic::Ordering::SeqCst) {
        return;
    }
    ctx.sessions.add(
        &p.session_id,
        &p.target_info.target_id,
        &p.target_info.url,
        &p.target_info.title,
    );
    debug!(session_id = %p.session_id, url = %p.target_info.url, "session attached");

    // Enable per-session domains off the read loop. Network is deliberately
    // absent: enabling it makes Runtime.evaluate wait for network-idle,
    // which wrecks html/eval latency. It is enabled lazily on the first
    // network query for the session.
    let Some(client) = ctx.client() else { return };
    let session_id = p.session_id;
    tokio::spawn(async move {
        for (method, params) in [
            ("Runtime.enable", json!({})),
            ("Page.enable", json!({})),
            ("DOM.enable", json!({})),
            ("Page.setLifecycleEventsEnabled", json!({"enabled": true})),
        ] {
            if let Err(e) =
                client.send_to_session(&session_id, method, Some(params), ENABLE_TIMEOUT).await
            {
                debug!(session_id = %session_id, method, error = %e, "domain enable failed");
            }
        }
    });
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetachedParams {
    session_id: String,
}

fn on_detached(ctx: &Arc<Ctx>, event: &CdpEvent) {
    let Some(p) = parse::<DetachedParams>(event) else { return };
    if let Some(session) = ctx.sessions.get(&p.session_id) {
        ctx.attached.lock().remove(&session.target_id);
    }
    ctx.sessions.remove(&p.session_id);
    ctx.network_enabled.lock().remove(&p.session_id);
    ctx.nav.finish_navigation(&p.session_id);
    ctx.nav.clear_load_waiter(&p.session_id);
    ctx.nav.clear_nav_waiter(&p.session_id);
    let sid = p.session_id.clone();
    ctx.console.remove_if(|e| e.session_id == sid);
    ctx.network.remove_if(|e| e.session_id == sid);
    debug!(session_id = %p.session_id, "session detached");
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoChangedParams {
    target_info: TargetInfo,
}

fn on_target_info_changed(ctx: &Arc<Ctx>, event: &CdpEvent) {
    let Some(p) = parse::<InfoChangedParams>(event) else { return };
    ctx.sessions.update_by_target(&p.target_info.target_id, &p.target_info.url, &p.target_info.title);
}

// ---- Console ----

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RemoteObject {
    #[serde(rename = "type")]
    kind: String,
    value: Option<serde_json::Value>,
    description: Option<String>,
}

impl RemoteObject {
    fn describe(&self) -> String {
        if let Some(value) = &self.value {
            match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }
        } else if let Some(description) = &self.description {
            description.clone()
        } else {
            self.kind.clone()
        }
    }

    fn raw(&self) -> serde_json::Value {
        self.value
            .clone()
            .or_else(|| self.description.clone().map(serde_json::Value::String))
            .unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConsoleApiParams {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    args: Vec<RemoteObject>,
    #[serde(default)]
    timestamp: f64,
    stack_trace: Option<StackTrace>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StackTrace {
    call_frames: Vec<CallFrame>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CallFrame {
    url: String,
    line_number: u32,
    column_number: u32,
}

fn on_console(ctx: &Arc<Ctx>, event: &CdpEvent) {
    let Some(p) = parse::<ConsoleApiParams>(event) else { return };
    let session_id = event.session_id.clone().unwrap_or_default();
    let frame = p.stack_trace.as_ref().and_then(|st| st.call_frames.first());
    let text =
        p.args.iter().map(RemoteObject::describe).collect::<Vec<_>>().join(" ");
    ctx.console.push(ConsoleEntry {
        session_id,
        kind: ConsoleKind::from_protocol(&p.kind),
        text,
        args: p.args.iter().map(RemoteObject::raw).collect(),
        url: frame.map(|f| f.url.clone()).unwrap_or_default(),
        line: frame.map(|f| f.line_number).unwrap_or_default(),
        column: frame.map(|f| f.column_number).unwrap_or_default(),
        // consoleAPICalled timestamps are already epoch ms
        timestamp_ms: if p.timestamp > 0.0 { p.timestamp as u64 } else { now_ms() },
    });
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExceptionParams {
    exception_details: ExceptionDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ExceptionDetails {
    text: String,
    exception: Option<RemoteObject>,
    url: String,
    line_number: u32,
    column_number: u32,
}

fn on_exception(ctx: &Arc<Ctx>, event: &CdpEvent) {
    let Some(p) = parse::<ExceptionParams>(event) else { return };
    let d = p.exception_details;
    let text = d
        .exception
        .as_ref()
        .and_then(|e| e.description.clone())
        .unwrap_or_else(|| d.text.clone());
    ctx.console.push(ConsoleEntry {
        session_id: event.session_id.clone().unwrap_or_default(),
        kind: ConsoleKind::Error,
        text,
        args: Vec::new(),
        url: d.url,
        line: d.line_number,
        column: d.column_number,
        timestamp_ms: now_ms(),
    });
}

// ---- Network ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestWillBeSentParams {
    request_id: String,
    request: RequestInfo,
    #[serde(default)]
    wall_time: f64,
    #[serde(rename = "type", default)]
    resource_type: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RequestInfo {
    url: String,
    method: String,
    headers: serde_json::Map<String, serde_json::Value>,
}

fn on_request_will_be_sent(ctx: &Arc<Ctx>, event: &CdpEvent) {
    let Some(p) = parse::<RequestWillBeSentParams>(event) else { return };
    ctx.network.push(NetworkEntry {
        session_id: event.session_id.clone().unwrap_or_default(),
        request_id: p.request_id,
        url: p.request.url,
        method: p.request.method,
        resource_type: p.resource_type,
        request_headers: p.request.headers,
        // Unix ms from wallTime; the monotonic `timestamp` is useless
        // across processes
        request_time_ms: bp_core::time::wall_time_to_ms(p.wall_time),
        ..Default::default()
    });
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseReceivedParams {
    request_id: String,
    response: ResponseInfo,
    #[serde(rename = "type", default)]
    resource_type: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ResponseInfo {
    status: i64,
    status_text: String,
    headers: serde_json::Map<String, serde_json::Value>,
    mime_type: String,
}

fn on_response_received(ctx: &Arc<Ctx>, event: &CdpEvent) {
    let Some(p) = parse::<ResponseReceivedParams>(event) else { return };
    let session_id = event.session_id.clone().unwrap_or_default();
    let response_time = now_ms() as f64;
    ctx.network.update(|e| {
        if e.request_id != p.request_id || e.session_id != session_id {
            return false;
        }
        e.status = p.response.status;
        e.status_text = p.response.status_text.clone();
        e.mime_type = p.response.mime_type.clone();
        e.response_headers = p.response.headers.clone();
        if !p.resource_type.is_empty() {
            e.resource_type = p.resource_type.clone();
        }
        e.response_time_ms = response_time;
        if e.request_time_ms > 0.0 {
            e.duration_s = (response_time - e.request_time_ms) / 1000.0;
        }
        true
    });
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadingFinishedParams {
    request_id: String,
    #[serde(default)]
    encoded_data_length: f64,
}

fn on_loading_finished(ctx: &Arc<Ctx>, event: &CdpEvent) {
    let Some(p) = parse::<LoadingFinishedParams>(event) else { return };
    let session_id = event.session_id.clone().unwrap_or_default();
    let mut mime = String::new();
    ctx.network.update(|e| {
        if e.request_id != p.request_id || e.session_id != session_id {
            return false;
        }
        e.size = p.encoded_data_length;
        mime = e.mime_type.clone();
        true
    });
    fetch_body(ctx, session_id, p.request_id, mime);
}

/// Fetch the response body off the read loop. The call goes to the event's
/// session — the browser-scoped channel does not know the request id.
fn fetch_body(ctx: &Arc<Ctx>, session_id: String, request_id: String, mime: String) {
    if session_id.is_empty() {
        return;
    }
    let Some(client) = ctx.client() else { return };
    let ctx = Arc::clone(ctx);
    tokio::spawn(async move {
        let result = client
            .send_to_session(
                &session_id,
                "Network.getResponseBody",
                Some(json!({"requestId": request_id})),
                BODY_TIMEOUT,
            )
            .await;
        let value = match result {
            Ok(value) => value,
            Err(e) => {
                debug!(request_id = %request_id, error = %e, "body fetch failed");
                return;
            }
        };
        let body = value["body"].as_str().unwrap_or_default();
        let base64_encoded = value["base64Encoded"].as_bool().unwrap_or(false);

        let (inline, path) = if base64_encoded {
            let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(body) else {
                return;
            };
            if bodies::is_binary_mime(&mime) {
                match bodies::write_body(&ctx.bodies_dir, &request_id, &url_of(&ctx, &request_id), &bytes)
                {
                    Ok(path) => (String::new(), path.display().to_string()),
                    Err(e) => {
                        warn!(request_id = %request_id, error = %e, "body persist failed");
                        return;
                    }
                }
            } else {
                (String::from_utf8_lossy(&bytes).into_owned(), String::new())
            }
        } else {
            (body.to_string(), String::new())
        };

        ctx.network.update(|e| {
            if e.request_id != request_id || e.session_id != session_id {
                return false;
            }
            e.body = inline.clone();
            e.body_path = path.clone();
            true
        });
    });
}

fn url_of(ctx: &Arc<Ctx>, request_id: &str) -> String {
    let mut url = String::new();
    ctx.network.update(|e| {
        if e.request_id == request_id {
            url = e.url.clone();
            true
        } else {
            false
        }
    });
    url
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadingFailedParams {
    request_id: String,
    #[serde(default)]
    error_text: String,
    #[serde(default)]
    canceled: bool,
}

fn on_loading_failed(ctx: &Arc<Ctx>, event: &CdpEvent) {
    let Some(p) = parse::<LoadingFailedParams>(event) else { return };
    let session_id = event.session_id.clone().unwrap_or_default();
    ctx.network.update(|e| {
        if e.request_id != p.request_id || e.session_id != session_id {
            return false;
        }
        e.failed = true;
        e.error = if p.canceled { "canceled".to_string() } else { p.error_text.clone() };
        true
    });
}

// ---- Navigation ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameNavigatedParams {
    frame: FrameInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FrameInfo {
    parent_id: Option<String>,
    url: String,
}

fn on_frame_navigated(ctx: &Arc<Ctx>, event: &CdpEvent) {
    let Some(p) = parse::<FrameNavigatedParams>(event) else { return };
    // Subframes navigate constantly; only the main frame counts
    if p.frame.parent_id.as_deref().is_some_and(|id| !id.is_empty()) {
        return;
    }
    let Some(session_id) = event.session_id.clone() else { return };
    ctx.sessions.update(&session_id, &p.frame.url, "");

    if !ctx.nav.has_nav_waiter(&session_id) {
        return;
    }
    let url = p.frame.url;
    match ctx.client() {
        Some(client) => {
            // Title needs a JS evaluation — off the read loop, best-effort
            let ctx = Arc::clone(ctx);
            tokio::spawn(async move {
                let title = client
                    .send_to_session(
                        &session_id,
                        "Runtime.evaluate",
                        Some(json!({"expression": "document.title", "returnByValue": true})),
                        TITLE_TIMEOUT,
                    )
                    .await
                    .ok()
                    .and_then(|v| v["result"]["value"].as_str().map(str::to_string))
                    .unwrap_or_default();
                ctx.sessions.update(&session_id, "", &title);
                ctx.nav.signal_nav(&session_id, NavResult { url, title });
            });
        }
        None => ctx.nav.signal_nav(&session_id, NavResult { url, title: String::new() }),
    }
}

fn on_load_event(ctx: &Arc<Ctx>, event: &CdpEvent) {
    let Some(session_id) = event.session_id.as_deref() else { return };
    ctx.nav.signal_load(session_id);
    ctx.nav.finish_navigation(session_id);
}

fn on_dom_content_event(ctx: &Arc<Ctx>, event: &CdpEvent) {
    let Some(session_id) = event.session_id.as_deref() else { return };
    // DOM-only consumers may proceed without waiting for the load event
    ctx.nav.finish_navigation(session_id);
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
