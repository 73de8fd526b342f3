// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scale-up failures and the mailbox message that carries them to the
//! Scale-Down Loop (§3 Scale-Up Failure Record, Mailbox Message).

use crate::label::LabelSet;
use serde::{Deserialize, Serialize};

/// The taxonomy of scale-up failures that are worth telling the Scale-Down
/// Loop about, because freeing capacity might resolve them (§7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleUpFailureKind {
    /// The global `max_runners` cap was hit before a server could be
    /// created.
    MaxNumberOfServersReached,
    /// The cloud provider rejected the create call with
    /// `resource_limit_exceeded`.
    ResourceLimitExceeded,
}

/// A one-way record posted from Scale-Up to Scale-Down (§3 Mailbox Message).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxMessage {
    pub at_secs: u64,
    pub labels: LabelSet,
    pub server_name: String,
    pub kind: ScaleUpFailureKind,
    pub detail: String,
}

/// Aggregated by `server_name` in the Scale-Down Loop's accounting map
/// (§3 Scale-Up Failure Record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleUpFailureRecord {
    pub first_seen_secs: u64,
    pub last_seen_secs: u64,
    pub count: u32,
    pub server_name: String,
    pub labels: LabelSet,
    pub detail: String,
}

impl ScaleUpFailureRecord {
    pub fn new(message: &MailboxMessage) -> Self {
        Self {
            first_seen_secs: message.at_secs,
            last_seen_secs: message.at_secs,
            count: 1,
            server_name: message.server_name.clone(),
            labels: message.labels.clone(),
            detail: message.detail.clone(),
        }
    }

    /// Fold a subsequent mailbox message for the same server name into this
    /// record. Mailbox monotonicity (§8): `last_seen_secs` and `count` are
    /// non-decreasing until the entry is forgotten.
    pub fn observe(&mut self, message: &MailboxMessage) {
        self.last_seen_secs = self.last_seen_secs.max(message.at_secs);
        self.count += 1;
        self.detail.clone_from(&message.detail);
    }
}

#[cfg(test)]
#[path = "failure_tests.rs"]
mod tests;
