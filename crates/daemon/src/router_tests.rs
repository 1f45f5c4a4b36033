// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router tests drive synthetic events through `handle` with no client
//! installed; the spawned follow-up calls are skipped and the synchronous
//! state mutations are observable directly.

use super::*;
use bp_core::time::now_ms;

fn ctx() -> Arc<Ctx> {
    Arc::new(Ctx::new(std::env::temp_dir().join("bp-router-tests")))
}

fn ev(method: &str, session_id: Option<&str>, params: serde_json::Value) -> CdpEvent {
    CdpEvent {
        method: method.to_string(),
        params,
        session_id: session_id.map(str::to_string),
    }
}

fn attach(ctx: &Arc<Ctx>, session_id: &str, target_id: &str, url: &str) {
    handle(
        ctx,
        &ev(
            "Target.attachedToTarget",
            None,
            json!({
                "sessionId": session_id,
                "targetInfo": {
                    "targetId": target_id, "type": "page",
                    "url": url, "title": "A Page",
                },
            }),
        ),
    );
}

#[test]
fn attached_page_target_becomes_session() {
    let ctx = ctx();
    attach(&ctx, "s1", "t1", "https://example.com/");
    let session = ctx.sessions.active().unwrap();
    assert_eq!(session.session_id, "s1");
    assert_eq!(session.target_id, "t1");
    assert_eq!(session.url, "https://example.com/");
}

#[test]
fn attached_worker_target_is_ignored() {
    let ctx = ctx();
    handle(
        &ctx,
        &ev(
            "Target.attachedToTarget",
            None,
            json!({
                "sessionId": "w1",
                "targetInfo": {"targetId": "t9", "type": "service_worker", "url": "", "title": ""},
            }),
        ),
    );
    assert!(ctx.sessions.is_empty());
}

#[test]
fn attach_is_skipped_while_reconnecting() {
    let ctx = ctx();
    ctx.reconnecting.store(true, std::sync::atomic::Ordering::SeqCst);
    attach(&ctx, "s1", "t1", "http://x/");
    assert!(ctx.sessions.is_empty(), "stale attach must not repopulate the map");
}

#[test]
fn created_page_target_attach_mark_rolls_back_without_client() {
    let ctx = ctx();
    handle(
        &ctx,
        &ev(
            "Target.targetCreated",
            None,
            json!({"targetInfo": {"targetId": "t1", "type": "page", "url": "", "title": ""}}),
        ),
    );
    // No client installed: the mark is cleared so a retry stays possible
    assert!(ctx.attached.lock().is_empty());
}

#[test]
fn created_non_page_target_is_not_attached() {
    let ctx = ctx();
    handle(
        &ctx,
        &ev(
            "Target.targetCreated",
            None,
            json!({"targetInfo": {"targetId": "t2", "type": "browser", "url": "", "title": ""}}),
        ),
    );
    assert!(ctx.attached.lock().is_empty());
}

#[test]
fn detach_removes_session_and_purges_buffers() {
    let ctx = ctx();
    attach(&ctx, "s1", "t1", "http://a/");
    attach(&ctx, "s2", "t2", "http://b/");
    handle(
        &ctx,
        &ev("Runtime.consoleAPICalled", Some("s1"), json!({"type": "log", "args": []})),
    );
    handle(
        &ctx,
        &ev(
            "Network.requestWillBeSent",
            Some("s1"),
            json!({"requestId": "r1", "request": {"url": "http://a/x", "method": "GET", "headers": {}}}),
        ),
    );

    handle(&ctx, &ev("Target.detachedFromTarget", None, json!({"sessionId": "s1"})));

    assert!(ctx.sessions.get("s1").is_none());
    assert_eq!(ctx.sessions.active_id(), "s2");
    assert!(ctx.console.is_empty());
    assert!(ctx.network.is_empty());
}

#[test]
fn info_change_updates_url_and_title() {
    let ctx = ctx();
    attach(&ctx, "s1", "t1", "http://old/");
    handle(
        &ctx,
        &ev(
            "Target.targetInfoChanged",
            None,
            json!({"targetInfo": {"targetId": "t1", "type": "page", "url": "http://new/", "title": "New"}}),
        ),
    );
    let s = ctx.sessions.get("s1").unwrap();
    assert_eq!(s.url, "http://new/");
    assert_eq!(s.title, "New");
}

#[test]
fn console_event_is_parsed_and_stamped() {
    let ctx = ctx();
    handle(
        &ctx,
        &ev(
            "Runtime.consoleAPICalled",
            Some("s1"),
            json!({
                "type": "warning",
                "args": [
                    {"type": "string", "value": "watch"},
                    {"type": "number", "value": 42},
                    {"type": "object", "description": "HTMLDivElement"},
                ],
                "timestamp": 1700000000123.0f64,
                "stackTrace": {"callFrames": [
                    {"url": "http://x/app.js", "lineNumber": 10, "columnNumber": 4},
                ]},
            }),
        ),
    );
    let entries = ctx.console.all();
    assert_eq!(entries.len(), 1);
    let e = &entries[0];
    assert_eq!(e.session_id, "s1");
    assert_eq!(e.kind, bp_core::ConsoleKind::Warn);
    assert_eq!(e.text, "watch 42 HTMLDivElement");
    assert_eq!(e.url, "http://x/app.js");
    assert_eq!(e.line, 10);
    assert_eq!(e.column, 4);
    assert_eq!(e.timestamp_ms, 1700000000123);
}

#[test]
fn exception_becomes_error_entry() {
    let ctx = ctx();
    handle(
        &ctx,
        &ev(
            "Runtime.exceptionThrown",
            Some("s1"),
            json!({
                "exceptionDetails": {
                    "text": "Uncaught",
                    "exception": {"type": "object", "description": "ReferenceError: nope is not defined"},
                    "url": "http://x/",
                    "lineNumber": 1,
                    "columnNumber": 2,
                },
            }),
        ),
    );
    let entries = ctx.console.all();
    assert_eq!(entries[0].kind, bp_core::ConsoleKind::Error);
    assert!(entries[0].text.contains("nope is not defined"));
}

#[test]
fn network_entry_mutates_through_request_response_finish() {
    let ctx = ctx();
    let wall = now_ms() as f64 / 1000.0;
    handle(
        &ctx,
        &ev(
            "Network.requestWillBeSent",
            Some("s1"),
            json!({
                "requestId": "r1",
                "request": {"url": "http://x/api", "method": "GET", "headers": {"Accept": "*/*"}},
                "wallTime": wall,
                "type": "XHR",
            }),
        ),
    );
    handle(
        &ctx,
        &ev(
            "Network.responseReceived",
            Some("s1"),
            json!({
                "requestId": "r1",
                "response": {
                    "status": 200, "statusText": "OK",
                    "headers": {"Content-Type": "application/json"},
                    "mimeType": "application/json",
                },
                "type": "XHR",
            }),
        ),
    );
    handle(
        &ctx,
        &ev(
            "Network.loadingFinished",
            Some("s1"),
            json!({"requestId": "r1", "encodedDataLength": 512.0}),
        ),
    );

    let entries = ctx.network.all();
    assert_eq!(entries.len(), 1);
    let e = &entries[0];
    assert!(e.request_time_ms > 0.0);
    assert!(e.response_time_ms >= e.request_time_ms);
    assert!((e.duration_s - (e.response_time_ms - e.request_time_ms) / 1000.0).abs() < 1e-9);
    assert_eq!(e.status, 200);
    assert_eq!(e.mime_type, "application/json");
    assert_eq!(e.size, 512.0);
}

#[test]
fn response_for_other_session_does_not_match() {
    let ctx = ctx();
    handle(
        &ctx,
        &ev(
            "Network.requestWillBeSent",
            Some("s1"),
            json!({"requestId": "r1", "request": {"url": "http://x/", "method": "GET", "headers": {}}}),
        ),
    );
    handle(
        &ctx,
        &ev(
            "Network.responseReceived",
            Some("s2"),
            json!({"requestId": "r1", "response": {"status": 500, "statusText": "", "headers": {}, "mimeType": ""}}),
        ),
    );
    assert_eq!(ctx.network.all()[0].status, 0);
}

#[yare::parameterized(
    canceled = { true, "canceled" },
    errored = { false, "net::ERR_CONNECTION_REFUSED" },
)]
fn loading_failed_marks_entry(canceled: bool, expected_error: &str) {
    let ctx = ctx();
    handle(
        &ctx,
        &ev(
            "Network.requestWillBeSent",
            Some("s1"),
            json!({"requestId": "r1", "request": {"url": "http://x/", "method": "GET", "headers": {}}}),
        ),
    );
    handle(
        &ctx,
        &ev(
            "Network.loadingFailed",
            Some("s1"),
            json!({
                "requestId": "r1",
                "errorText": "net::ERR_CONNECTION_REFUSED",
                "canceled": canceled,
            }),
        ),
    );
    let e = &ctx.network.all()[0];
    assert!(e.failed);
    assert_eq!(e.error, expected_error);
}

#[tokio::test]
async fn main_frame_navigation_signals_waiter() {
    let ctx = ctx();
    attach(&ctx, "s1", "t1", "http://old/");
    let mut rx = ctx.nav.register_nav_waiter("s1");
    handle(
        &ctx,
        &ev(
            "Page.frameNavigated",
            Some("s1"),
            json!({"frame": {"id": "f1", "url": "http://new/"}}),
        ),
    );
    let nav = rx.recv().await.unwrap();
    assert_eq!(nav.url, "http://new/");
    assert_eq!(ctx.sessions.get("s1").unwrap().url, "http://new/");
}

#[tokio::test]
async fn subframe_navigation_is_ignored() {
    let ctx = ctx();
    attach(&ctx, "s1", "t1", "http://old/");
    let mut rx = ctx.nav.register_nav_waiter("s1");
    handle(
        &ctx,
        &ev(
            "Page.frameNavigated",
            Some("s1"),
            json!({"frame": {"id": "f2", "parentId": "f1", "url": "http://iframe/"}}),
        ),
    );
    assert_eq!(ctx.sessions.get("s1").unwrap().url, "http://old/");
    let got = tokio::time::timeout(std::time::Duration::from_millis(50), rx.recv()).await;
    assert!(got.is_err(), "subframe must not signal the waiter");
}

#[tokio::test]
async fn load_event_signals_waiter_and_closes_navigation() {
    let ctx = ctx();
    ctx.nav.begin_navigation("s1");
    let rx = ctx.nav.register_load_waiter("s1");
    handle(&ctx, &ev("Page.loadEventFired", Some("s1"), json!({"timestamp": 1.0})));
    rx.await.unwrap();
    assert!(!ctx.nav.is_navigating("s1"));
}

#[test]
fn dom_content_closes_navigation_without_load() {
    let ctx = ctx();
    ctx.nav.begin_navigation("s1");
    handle(&ctx, &ev("Page.domContentEventFired", Some("s1"), json!({"timestamp": 1.0})));
    assert!(!ctx.nav.is_navigating("s1"));
}

#[test]
fn unknown_method_is_ignored() {
    let ctx = ctx();
    handle(&ctx, &ev("Some.unknownEvent", None, json!({})));
    assert!(ctx.console.is_empty());
    assert!(ctx.network.is_empty());
}
