// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn bare_request_serializes_minimal() {
    let json = serde_json::to_value(Request::new("status")).unwrap();
    assert_eq!(json, serde_json::json!({"cmd": "status"}));
}

#[test]
fn params_and_debug_are_preserved() {
    let mut req = Request::with_params("eval", serde_json::json!({"expression": "1+1"}));
    req.debug = true;
    let json = serde_json::to_string(&req).unwrap();
    let back: Request = serde_json::from_str(&json).unwrap();
    assert_eq!(back, req);
    assert!(back.debug);
}

#[test]
fn missing_optional_fields_default() {
    let req: Request = serde_json::from_str(r#"{"cmd":"console"}"#).unwrap();
    assert_eq!(req.cmd, "console");
    assert!(req.target.is_none());
    assert!(req.params.is_null());
    assert!(!req.debug);
}

#[test]
fn target_field_roundtrips() {
    let req: Request = serde_json::from_str(r#"{"cmd":"target","target":"docs"}"#).unwrap();
    assert_eq!(req.target.as_deref(), Some("docs"));
}
