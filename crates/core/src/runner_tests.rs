// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::label::label_set;

#[test]
fn unused_candidate_covers_idle_and_offline() {
    assert!(RunnerStatus::OnlineIdle.is_unused_candidate());
    assert!(RunnerStatus::Offline.is_unused_candidate());
    assert!(!RunnerStatus::OnlineBusy.is_unused_candidate());
}

#[test]
fn belongs_to_server_checks_name_prefix() {
    let runner = Runner {
        id: 1,
        name: "runner-100-200-abcdef".to_string(),
        status: RunnerStatus::OnlineIdle,
        labels: label_set(["self-hosted"]),
    };
    assert!(runner.belongs_to_server("runner-100-200"));
    assert!(!runner.belongs_to_server("runner-999-1"));
}
