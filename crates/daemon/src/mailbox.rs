// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox: the Scale-Up Loop's worker futures post failures here
//! (§4.4 step 5) and the Scale-Down Loop drains and aggregates them by
//! server name (§4.5 step 6). A plain mutex-guarded `Vec` is enough —
//! both sides run at loop-interval cadence, not per-request.

use parking_lot::Mutex;
use runner_core::failure::{MailboxMessage, ScaleUpFailureRecord};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Mailbox {
    inner: Arc<Mutex<Vec<MailboxMessage>>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, message: MailboxMessage) {
        self.inner.lock().push(message);
    }

    /// Remove and return every pending message, aggregated by server name
    /// into a single record each (§4.5 step 6: "aggregate by server_name").
    pub fn drain_aggregated(&self) -> BTreeMap<String, ScaleUpFailureRecord> {
        let messages = std::mem::take(&mut *self.inner.lock());
        let mut by_server: BTreeMap<String, ScaleUpFailureRecord> = BTreeMap::new();
        for message in &messages {
            by_server
                .entry(message.server_name.clone())
                .and_modify(|record| record.observe(message))
                .or_insert_with(|| ScaleUpFailureRecord::new(message));
        }
        by_server
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
