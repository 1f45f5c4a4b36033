// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bp_core::{ConsoleEntry, ConsoleKind};
use bp_core::time::now_ms;
use bp_wire::Request;
use serde_json::json;

fn ctx() -> Arc<Ctx> {
    let dir = tempfile::tempdir().unwrap();
    Arc::new(Ctx::new(dir.path().join("bodies")))
}

fn console_entry(session_id: &str, text: &str) -> ConsoleEntry {
    ConsoleEntry {
        session_id: session_id.to_string(),
        kind: ConsoleKind::Log,
        text: text.to_string(),
        args: vec![],
        url: String::new(),
        line: 0,
        column: 0,
        timestamp_ms: now_ms(),
    }
}

#[tokio::test]
async fn unknown_command_is_rejected() {
    let ctx = ctx();
    let resp = dispatch(&ctx, &Request::new("frobnicate")).await;
    assert!(!resp.ok);
    assert_eq!(resp.error.as_deref(), Some("unknown command: frobnicate"));
}

#[tokio::test]
async fn find_is_a_removed_alias() {
    let ctx = ctx();
    let resp = dispatch(&ctx, &Request::new("find")).await;
    assert!(!resp.ok);
    assert!(resp.error.unwrap().contains("html --select"));
}

#[tokio::test]
async fn console_without_sessions_returns_structured_error() {
    let ctx = ctx();
    let resp = dispatch(&ctx, &Request::new("console")).await;
    assert!(!resp.ok);
    assert!(resp.error.unwrap().contains("no active session"));
    // The session list rides along so the caller can pick one
    assert_eq!(resp.data, Some(json!([])));
}

#[tokio::test]
async fn console_filters_to_active_session() {
    let ctx = ctx();
    ctx.sessions.add("s1", "t1", "http://a/", "A");
    ctx.sessions.add("s2", "t2", "http://b/", "B");
    ctx.console.push(console_entry("s1", "from s1"));
    ctx.console.push(console_entry("s2", "from s2"));

    let resp = dispatch(&ctx, &Request::new("console")).await;
    assert!(resp.ok);
    let entries = resp.data.unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["text"], "from s1");
}

#[tokio::test]
async fn clear_console_empties_only_console() {
    let ctx = ctx();
    ctx.console.push(console_entry("s1", "x"));
    ctx.network.push(Default::default());

    let resp =
        dispatch(&ctx, &Request::with_params("clear", json!({"what": "console"}))).await;
    assert!(resp.ok);
    assert!(ctx.console.is_empty());
    assert_eq!(ctx.network.len(), 1);
}

#[tokio::test]
async fn clear_all_empties_both_buffers() {
    let ctx = ctx();
    ctx.console.push(console_entry("s1", "x"));
    ctx.network.push(Default::default());

    let resp = dispatch(&ctx, &Request::with_params("clear", json!({"what": "all"}))).await;
    assert!(resp.ok);
    assert!(ctx.console.is_empty());
    assert!(ctx.network.is_empty());
}

#[tokio::test]
async fn clear_rejects_unknown_buffer() {
    let ctx = ctx();
    let resp = dispatch(&ctx, &Request::with_params("clear", json!({"what": "cache"}))).await;
    assert!(!resp.ok);
    assert!(resp.error.unwrap().contains("unknown buffer"));
}

#[tokio::test]
async fn target_with_empty_query_lists_sessions() {
    let ctx = ctx();
    ctx.sessions.add("s1", "t1", "http://a/", "Alpha");
    ctx.sessions.add("s2", "t2", "http://b/", "Beta");

    let resp = dispatch(&ctx, &Request::new("target")).await;
    assert!(resp.ok);
    let data = resp.data.unwrap();
    assert_eq!(data["sessions"].as_array().unwrap().len(), 2);
    assert_eq!(data["activeSession"]["sessionId"], "s1");
}

#[tokio::test]
async fn target_selects_single_match() {
    let ctx = ctx();
    ctx.sessions.add("s1", "t1", "http://a/", "Alpha");
    ctx.sessions.add("s2", "t2", "http://b/", "Beta");

    let mut req = Request::new("target");
    req.target = Some("Beta".to_string());
    let resp = dispatch(&ctx, &req).await;
    assert!(resp.ok);
    assert_eq!(ctx.sessions.active_id(), "s2");
}

#[tokio::test]
async fn target_ambiguity_returns_matches() {
    let ctx = ctx();
    ctx.sessions.add("s1", "t1", "http://a/", "Docs - intro");
    ctx.sessions.add("s2", "t2", "http://b/", "Docs - api");

    let mut req = Request::new("target");
    req.target = Some("docs".to_string());
    let resp = dispatch(&ctx, &req).await;
    assert!(!resp.ok);
    assert!(resp.error.unwrap().contains("ambiguous"));
    assert_eq!(resp.data.unwrap().as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn target_no_match_is_a_user_error() {
    let ctx = ctx();
    ctx.sessions.add("s1", "t1", "http://a/", "Alpha");
    let mut req = Request::new("target");
    req.target = Some("zzz".to_string());
    let resp = dispatch(&ctx, &req).await;
    assert!(!resp.ok);
    assert!(resp.error.unwrap().contains("no session matches"));
}

#[tokio::test]
async fn status_reports_pid_and_connection() {
    let ctx = ctx();
    ctx.sessions.add("s1", "t1", "https://example.com/", "Example");
    let resp = dispatch(&ctx, &Request::new("status")).await;
    assert!(resp.ok);
    let data = resp.data.unwrap();
    assert_eq!(data["running"], true);
    assert!(data["pid"].as_u64().unwrap() > 0);
    assert_eq!(data["connection"]["state"], "connected");
    assert_eq!(data["sessions"][0]["sessionId"], "s1");
    assert_eq!(data["activeSession"]["url"], "https://example.com/");
}

#[tokio::test]
async fn status_enriches_sessions_with_document_status() {
    let ctx = ctx();
    ctx.sessions.add("s1", "t1", "https://example.com/", "Example");
    ctx.network.push(bp_core::NetworkEntry {
        session_id: "s1".into(),
        resource_type: "Document".into(),
        status: 404,
        ..Default::default()
    });
    let resp = dispatch(&ctx, &Request::new("status")).await;
    let data = resp.data.unwrap();
    assert_eq!(data["sessions"][0]["httpStatus"], 404);
}

#[tokio::test]
async fn navigate_requires_url() {
    let ctx = ctx();
    ctx.sessions.add("s1", "t1", "http://a/", "A");
    let resp = dispatch(&ctx, &Request::with_params("navigate", json!({}))).await;
    assert!(!resp.ok);
    assert!(resp.error.unwrap().contains("url is required"));
}

#[tokio::test]
async fn browser_loss_fails_fast_with_shutdown() {
    let ctx = ctx();
    ctx.sessions.add("s1", "t1", "http://a/", "A");
    // No client installed: the liveness gate must trip
    let resp =
        dispatch(&ctx, &Request::with_params("eval", json!({"expression": "1+1"}))).await;
    assert!(!resp.ok);
    assert_eq!(
        resp.error.as_deref(),
        Some("browser connection lost - daemon shutting down")
    );
    assert!(ctx.is_shutting_down());
    assert!(ctx.sessions.is_empty(), "session state is cleared on fail-fast");
}

#[tokio::test]
async fn concurrent_handlers_observe_one_shutdown() {
    let ctx = ctx();
    ctx.sessions.add("s1", "t1", "http://a/", "A");
    let reqs = (0..4).map(|_| Request::with_params("eval", json!({"expression": "1"})));
    let results = futures_util::future::join_all(
        reqs.map(|r| {
            let ctx = Arc::clone(&ctx);
            async move { dispatch(&ctx, &r).await }
        }),
    )
    .await;
    for resp in results {
        assert!(!resp.ok);
    }
    assert!(ctx.is_shutting_down());
}

#[tokio::test]
async fn shutdown_command_acknowledges_and_signals() {
    let ctx = ctx();
    let resp = dispatch(&ctx, &Request::new("shutdown")).await;
    assert!(resp.ok);
    assert_eq!(resp.data.unwrap()["shuttingDown"], true);
    assert!(ctx.is_shutting_down());
}

#[tokio::test]
async fn reconnect_when_connected_is_a_noop_success() {
    let ctx = ctx();
    let resp = dispatch(&ctx, &Request::new("reconnect")).await;
    assert!(resp.ok);
    assert_eq!(resp.data.unwrap()["state"], "connected");
}

#[tokio::test]
async fn key_requires_a_live_browser() {
    let ctx = ctx();
    ctx.sessions.add("s1", "t1", "http://a/", "A");
    // The liveness gate runs before key lookup
    let resp = dispatch(&ctx, &Request::with_params("key", json!({"key": "NotAKey"}))).await;
    assert!(!resp.ok);
    assert!(ctx.is_shutting_down());
}

#[test]
fn params_rejects_wrong_shape() {
    let err = params::<super::nav_params_probe::Probe>(&json!({"wait": "yes"})).unwrap_err();
    assert!(matches!(err, HandlerError::InvalidParams(_)));
}

#[test]
fn params_null_uses_defaults() {
    let p = params::<super::nav_params_probe::Probe>(&serde_json::Value::Null).unwrap();
    assert!(!p.wait);
}
