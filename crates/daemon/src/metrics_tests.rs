// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn counters_accumulate_independently() {
    let metrics = Metrics::new();
    metrics.server_created();
    metrics.server_created();
    metrics.server_recycled();
    metrics.mailbox_failure_posted();

    let line = metrics.snapshot_line();
    assert!(line.contains("servers_created=2"));
    assert!(line.contains("servers_recycled=1"));
    assert!(line.contains("servers_deleted=0"));
    assert!(line.contains("mailbox_posted=1"));
}

#[test]
fn cloned_handles_share_the_same_counters() {
    let metrics = Metrics::new();
    let clone = metrics.clone();
    clone.server_deleted();
    assert!(metrics.snapshot_line().contains("servers_deleted=1"));
}
