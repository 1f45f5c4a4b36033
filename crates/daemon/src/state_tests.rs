// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bp_core::NetworkEntry;

fn ctx() -> Arc<Ctx> {
    Arc::new(Ctx::new(std::env::temp_dir().join("bp-test-bodies")))
}

#[test]
fn signal_shutdown_fires_once() {
    let ctx = ctx();
    assert!(ctx.signal_shutdown());
    assert!(!ctx.signal_shutdown());
    assert!(ctx.is_shutting_down());
    assert!(ctx.shutdown_token().is_cancelled());
}

#[test]
fn concurrent_disconnect_observers_trigger_exactly_one_shutdown() {
    let ctx = ctx();
    let mut handles = Vec::new();
    for _ in 0..8 {
        let ctx = Arc::clone(&ctx);
        handles.push(std::thread::spawn(move || ctx.connection_lost()));
    }
    let fired: usize =
        handles.into_iter().map(|h| h.join().unwrap() as usize).sum();
    assert_eq!(fired, 1, "exactly one observer must fire the shutdown");
}

#[test]
fn clear_session_state_keeps_ring_buffers() {
    let ctx = ctx();
    ctx.sessions.add("s1", "t1", "http://x/", "X");
    ctx.attached.lock().insert("t1".to_string());
    ctx.network_enabled.lock().insert("s1".to_string());
    ctx.network.push(NetworkEntry { session_id: "s1".into(), ..Default::default() });

    ctx.clear_session_state();

    assert!(ctx.sessions.is_empty());
    assert!(ctx.attached.lock().is_empty());
    assert!(ctx.network_enabled.lock().is_empty());
    assert_eq!(ctx.network.len(), 1, "buffers survive reconnection");
}

#[test]
fn doc_status_prefers_most_recent_document_entry() {
    let ctx = ctx();
    let entry = |status: i64, rt: &str| NetworkEntry {
        session_id: "s1".into(),
        resource_type: rt.into(),
        status,
        ..Default::default()
    };
    ctx.network.push(entry(301, "Document"));
    ctx.network.push(entry(200, "XHR"));
    ctx.network.push(entry(404, "Document"));
    ctx.network.push(entry(0, "Document")); // pending — ignored

    assert_eq!(ctx.doc_status_for("s1"), Some(404));
    assert_eq!(ctx.doc_status_for("other"), None);
}

#[test]
fn client_slot_starts_empty() {
    let ctx = ctx();
    assert!(ctx.client().is_none());
    assert!(ctx.take_client().is_none());
}
