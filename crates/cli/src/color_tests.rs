// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn no_color_wins_over_color() {
    std::env::set_var("NO_COLOR", "1");
    std::env::set_var("COLOR", "1");
    assert!(!should_colorize());
    std::env::remove_var("NO_COLOR");
    std::env::remove_var("COLOR");
}

#[test]
#[serial]
fn color_forces_when_not_a_tty() {
    std::env::remove_var("NO_COLOR");
    std::env::set_var("COLOR", "1");
    assert!(should_colorize());
    std::env::remove_var("COLOR");
}

#[test]
#[serial]
fn paint_is_plain_without_color() {
    std::env::set_var("NO_COLOR", "1");
    assert_eq!(paint(codes::ERROR, "boom"), "boom");
    std::env::remove_var("NO_COLOR");
}

#[test]
#[serial]
fn paint_wraps_with_escapes_when_forced() {
    std::env::remove_var("NO_COLOR");
    std::env::set_var("COLOR", "1");
    let painted = paint(codes::HEADER, "hdr");
    std::env::remove_var("COLOR");
    assert!(painted.starts_with("\x1b[38;5;74m"));
    assert!(painted.ends_with("\x1b[0m"));
}
