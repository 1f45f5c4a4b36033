// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn ok_carries_data() {
    let resp = Response::ok(serde_json::json!({"value": 2}));
    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["ok"], true);
    assert_eq!(json["data"]["value"], 2);
    assert!(json.get("error").is_none());
}

#[test]
fn empty_has_no_data_or_error() {
    let json = serde_json::to_value(Response::empty()).unwrap();
    assert_eq!(json, serde_json::json!({"ok": true}));
}

#[test]
fn err_carries_message() {
    let resp = Response::err("no active session");
    assert!(!resp.ok);
    assert_eq!(resp.error.as_deref(), Some("no active session"));
}

#[test]
fn err_with_data_keeps_both() {
    let resp = Response::err_with_data(
        "ambiguous target",
        serde_json::json!([{"sessionId": "a"}, {"sessionId": "b"}]),
    );
    let json = serde_json::to_string(&resp).unwrap();
    let back: Response = serde_json::from_str(&json).unwrap();
    assert_eq!(back, resp);
    assert!(back.data.is_some());
}
