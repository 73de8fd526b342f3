// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn short_truncates() {
    assert_eq!(short("hello world", 5), "hello");
    assert_eq!(short("hi", 5), "hi");
}

#[test]
fn uid_is_stable_for_same_inputs() {
    assert_eq!(uid(100, 0), uid(100, 0));
    assert_ne!(uid(100, 0), uid(100, 1));
    assert_ne!(uid(100, 0), uid(101, 0));
}
