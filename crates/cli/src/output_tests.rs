// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    no_filter = { None, None, vec![1, 2, 3, 4, 5] },
    head_two = { Some(2), None, vec![1, 2] },
    tail_two = { None, Some(2), vec![4, 5] },
    head_then_tail = { Some(4), Some(2), vec![3, 4] },
    head_larger_than_list = { Some(99), None, vec![1, 2, 3, 4, 5] },
    tail_larger_than_list = { None, Some(99), vec![1, 2, 3, 4, 5] },
    head_zero = { Some(0), None, vec![] },
)]
fn head_tail_cases(head: Option<usize>, tail: Option<usize>, expected: Vec<i32>) {
    assert_eq!(head_tail(vec![1, 2, 3, 4, 5], head, tail), expected);
}

#[test]
fn format_time_ago_buckets() {
    let now = bp_core::time::now_ms();
    assert_eq!(format_time_ago(0), "-");
    assert_eq!(format_time_ago(now), "0s");
    assert_eq!(format_time_ago(now - 5_000), "5s");
    assert_eq!(format_time_ago(now - 120_000), "2m");
    assert_eq!(format_time_ago(now - 2 * 3600_000), "2h");
    assert_eq!(format_time_ago(now - 3 * 86400_000), "3d");
}

#[yare::parameterized(
    zero = { 0.0, "-" },
    small = { 512.0, "512B" },
    kilobytes = { 2048.0, "2.0KB" },
    megabytes = { 3.5 * 1024.0 * 1024.0, "3.5MB" },
)]
fn format_size_cases(bytes: f64, expected: &str) {
    assert_eq!(format_size(bytes), expected);
}
