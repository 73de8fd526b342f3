// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Server entity and the capability-label wire encoding (§3, §6.1).
//!
//! A server always carries its capability labels as cloud labels; the
//! Scale-Down Loop reconstructs the capability set from those labels alone
//! (§3 Invariants), so encode/decode must round-trip exactly (§8).

use crate::label::{fold, LabelSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cloud lifecycle state (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerLifecycle {
    Starting,
    Running,
    Off,
}

/// Runtime status derived from a matching runner, when one exists (§3
/// Runner, §4.4 step 1 "Annotate each server's status").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    /// No runner has registered for this server yet.
    Initializing,
    /// A runner is registered, online, and idle.
    Ready,
    /// A runner is registered, online, and running a job.
    Busy,
}

/// Key names used to encode/decode the capability-label schema onto a cloud
/// server's raw label map (§6.1 Required label schema).
#[derive(Debug, Clone)]
pub struct LabelSchema {
    /// Scope marker key, e.g. `<runner-label>=active`.
    pub active_key: String,
    /// SSH-key-fingerprint binding key, e.g. `<ssh-key-label>`.
    pub ssh_key_key: String,
    /// Indexed capability label key prefix, e.g. `<runner-label-prefix>-<i>`.
    pub capability_prefix: String,
    /// Recycle-timestamp key, stamped when a server is marked for recycling
    /// (supplemented from `original_source`'s `recycle_timestamp_label`).
    pub recycle_timestamp_key: String,
}

impl LabelSchema {
    pub fn new(runner_label: impl Into<String>) -> Self {
        let runner_label = runner_label.into();
        Self {
            active_key: runner_label.clone(),
            ssh_key_key: format!("{runner_label}-ssh-key"),
            capability_prefix: format!("{runner_label}-label"),
            recycle_timestamp_key: format!("{runner_label}-recycle-timestamp"),
        }
    }

    /// Encode a capability label set plus SSH key binding into the raw label
    /// map stamped on a server at creation/recycle time.
    pub fn encode(&self, labels: &LabelSet, ssh_key_fingerprint: &str) -> BTreeMap<String, String> {
        let mut raw = BTreeMap::new();
        raw.insert(self.active_key.clone(), "active".to_string());
        raw.insert(self.ssh_key_key.clone(), ssh_key_fingerprint.to_string());
        for (i, label) in labels.iter().enumerate() {
            raw.insert(format!("{}-{i}", self.capability_prefix), label.to_string());
        }
        raw
    }

    /// Reconstruct the capability label set from a server's raw label map
    /// alone, per the Invariants in §3.
    pub fn decode(&self, raw: &BTreeMap<String, String>) -> LabelSet {
        raw.iter()
            .filter(|(k, _)| k.starts_with(&self.capability_prefix))
            .map(|(_, v)| fold(v))
            .collect()
    }

    pub fn ssh_key_fingerprint(&self, raw: &BTreeMap<String, String>) -> Option<&str> {
        raw.get(&self.ssh_key_key).map(String::as_str)
    }

    pub fn recycle_marked_at(&self, raw: &BTreeMap<String, String>) -> Option<u64> {
        raw.get(&self.recycle_timestamp_key).and_then(|v| v.parse().ok())
    }

    pub fn stamp_recycle_timestamp(&self, raw: &mut BTreeMap<String, String>, now_secs: u64) {
        raw.insert(self.recycle_timestamp_key.clone(), now_secs.to_string());
    }
}

/// A type alias documenting that this is the decoded capability-label form,
/// as distinct from the raw string-keyed cloud label map.
pub type CapabilityLabels = LabelSet;

/// A cloud server snapshot as observed during one convergence cycle (§3).
///
/// `created_at_secs` anchors the billing-hour and end-of-life computations
/// in §3/§4.3; it is the server's creation time as reported by the cloud
/// provider, not a locally-tracked "first seen" timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub name: String,
    pub lifecycle: ServerLifecycle,
    pub server_type: String,
    pub location: String,
    pub ipv4: bool,
    pub ipv6: bool,
    pub created_at_secs: u64,
    pub labels: CapabilityLabels,
    pub ssh_key_fingerprint: Option<String>,
    pub recycle_marked_at: Option<u64>,
    /// Annotated from the matching runner, if any (§4.4 step 1). `None`
    /// only prior to annotation; an observed active server always carries
    /// `Some(_)`, with `Initializing` standing in for "no runner yet".
    pub status: Option<ServerStatus>,
}

impl Server {
    /// Minutes elapsed within the current billing hour, matching the
    /// original implementation's `age()` helper (`minutes` component only —
    /// that is the only component the billing/end-of-life logic consumes).
    pub fn minutes_into_current_hour(&self, now_secs: u64) -> u64 {
        let age_secs = now_secs.saturating_sub(self.created_at_secs);
        (age_secs / 60) % 60
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
