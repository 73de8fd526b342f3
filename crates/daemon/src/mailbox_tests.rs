// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use runner_core::failure::ScaleUpFailureKind;
use runner_core::label::LabelSet;

fn message(server_name: &str, at_secs: u64, kind: ScaleUpFailureKind) -> MailboxMessage {
    MailboxMessage {
        at_secs,
        labels: LabelSet::default(),
        server_name: server_name.to_string(),
        kind,
        detail: "boom".to_string(),
    }
}

#[test]
fn drain_aggregates_repeated_messages_for_the_same_server() {
    let mailbox = Mailbox::new();
    mailbox.post(message("srv-1", 10, ScaleUpFailureKind::ResourceLimitExceeded));
    mailbox.post(message("srv-1", 20, ScaleUpFailureKind::ResourceLimitExceeded));
    mailbox.post(message("srv-2", 15, ScaleUpFailureKind::MaxNumberOfServersReached));

    let aggregated = mailbox.drain_aggregated();
    assert_eq!(aggregated.len(), 2);
    assert_eq!(aggregated["srv-1"].count, 2);
    assert_eq!(aggregated["srv-1"].last_seen_secs, 20);
    assert_eq!(aggregated["srv-2"].count, 1);
}

#[test]
fn drain_empties_the_mailbox() {
    let mailbox = Mailbox::new();
    mailbox.post(message("srv-1", 10, ScaleUpFailureKind::ResourceLimitExceeded));
    let _ = mailbox.drain_aggregated();
    assert!(mailbox.is_empty());
}
