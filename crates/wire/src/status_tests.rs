// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bp_core::ConnectionState;

fn session(id: &str) -> Session {
    Session {
        session_id: id.to_string(),
        target_id: format!("target-{id}"),
        url: "https://example.com/".to_string(),
        title: "Example".to_string(),
    }
}

#[test]
fn session_status_flattens_session_fields() {
    let s = SessionStatus { session: session("s1"), http_status: Some(200) };
    let json = serde_json::to_value(&s).unwrap();
    assert_eq!(json["sessionId"], "s1");
    assert_eq!(json["httpStatus"], 200);
}

#[test]
fn http_status_is_omitted_when_absent() {
    let s = SessionStatus { session: session("s1"), http_status: None };
    let json = serde_json::to_value(&s).unwrap();
    assert!(json.get("httpStatus").is_none());
}

#[test]
fn status_data_roundtrips() {
    let data = StatusData {
        running: true,
        pid: 4242,
        browser_pid: Some(4243),
        sessions: vec![SessionStatus { session: session("s1"), http_status: Some(404) }],
        active_session: Some(session("s1")),
        connection: ConnectionInfo {
            state: ConnectionState::Connected,
            last_heartbeat_ms: 99,
            reconnect_count: 0,
            last_error: String::new(),
        },
    };
    let json = serde_json::to_string(&data).unwrap();
    let back: StatusData = serde_json::from_str(&json).unwrap();
    assert_eq!(back, data);
}

#[test]
fn target_data_roundtrips() {
    let data = TargetData { active_session: None, sessions: vec![session("a"), session("b")] };
    let json = serde_json::to_string(&data).unwrap();
    let back: TargetData = serde_json::from_str(&json).unwrap();
    assert_eq!(back, data);
}
