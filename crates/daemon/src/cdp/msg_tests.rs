// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn outgoing_omits_absent_fields() {
    let req = OutgoingRequest { id: 7, method: "Browser.getVersion", params: None, session_id: None };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json, serde_json::json!({"id": 7, "method": "Browser.getVersion"}));
}

#[test]
fn outgoing_tags_session_id() {
    let params = serde_json::json!({"url": "http://x/"});
    let req = OutgoingRequest {
        id: 1,
        method: "Page.navigate",
        params: Some(&params),
        session_id: Some("sess-1"),
    };
    let json = serde_json::to_value(&req).unwrap();
    assert_eq!(json["sessionId"], "sess-1");
    assert_eq!(json["params"]["url"], "http://x/");
}

#[test]
fn incoming_response_parses() {
    let frame: Incoming =
        serde_json::from_str(r#"{"id":3,"result":{"product":"Chrome"},"sessionId":"s"}"#).unwrap();
    assert_eq!(frame.id, Some(3));
    assert!(frame.method.is_none());
    assert_eq!(frame.result.unwrap()["product"], "Chrome");
}

#[test]
fn incoming_error_response_parses() {
    let frame: Incoming =
        serde_json::from_str(r#"{"id":4,"error":{"code":-32601,"message":"no such method"}}"#)
            .unwrap();
    let err = frame.error.unwrap();
    assert_eq!(err.code, -32601);
    assert_eq!(err.message, "no such method");
}

#[test]
fn incoming_event_parses() {
    let frame: Incoming = serde_json::from_str(
        r#"{"method":"Page.loadEventFired","params":{"timestamp":1.0},"sessionId":"s1"}"#,
    )
    .unwrap();
    assert!(frame.id.is_none());
    assert_eq!(frame.method.as_deref(), Some("Page.loadEventFired"));
    assert_eq!(frame.session_id.as_deref(), Some("s1"));
}
