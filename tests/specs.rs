// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level CLI specs. These exercise the built binaries without a
//! browser: help/version surfaces, exit codes, and daemon-not-running
//! behavior against an isolated state directory.

use assert_cmd::Command;

fn bp() -> Command {
    let mut cmd = Command::cargo_bin("bp").expect("bp binary");
    // Isolate from any real daemon on this machine
    let dir = tempfile::tempdir().expect("tempdir");
    cmd.env("BP_STATE_DIR", dir.path());
    // Keep the tempdir alive for the duration of the command
    Box::leak(Box::new(dir));
    cmd
}

#[test]
fn help_lists_the_command_surface() {
    let assert = bp().arg("--help").assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    for verb in [
        "status", "start", "stop", "reconnect", "target", "clear", "navigate", "reload",
        "back", "forward", "ready", "console", "network", "screenshot", "html", "css", "eval",
        "cookies", "click", "focus", "type", "key", "select", "scroll", "repl", "serve",
    ] {
        assert!(out.contains(verb), "--help must mention '{verb}'");
    }
}

#[test]
fn version_flag_prints_version() {
    let assert = bp().arg("--version").assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(out.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_verb_exits_nonzero() {
    bp().arg("frobnicate").assert().failure();
}

#[test]
fn status_without_daemon_reports_not_running() {
    let assert = bp().arg("status").assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(out.contains("daemon not running"));
}

#[test]
fn status_json_without_daemon() {
    let assert = bp().args(["status", "-o", "json"]).assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let json: serde_json::Value = serde_json::from_str(&out).expect("json output");
    assert_eq!(json["running"], false);
}

#[test]
fn eval_without_daemon_fails_with_hint() {
    let assert = bp().args(["eval", "1+1"]).assert().failure();
    let err = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8");
    assert!(err.contains("daemon not running"));
    assert!(err.contains("bp start"));
}

#[test]
fn find_is_a_removed_alias() {
    let assert = bp().args(["find", ".selector"]).assert().failure();
    let err = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8");
    assert!(err.contains("html --select"));
}

#[test]
fn stop_without_daemon_is_a_noop() {
    let assert = bp().arg("stop").assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(out.contains("daemon not running"));
}

#[test]
fn daemon_rejects_unexpected_arguments() {
    Command::cargo_bin("bpd").expect("bpd binary").arg("--bogus").assert().failure();
}

#[test]
fn daemon_version_flag() {
    let assert = Command::cargo_bin("bpd").expect("bpd binary").arg("--version").assert().success();
    let out = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(out.starts_with("bpd "));
}
