// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-level cloud server representation. Raw string-keyed labels here;
//! [`runner_core::server::LabelSchema`] is the boundary that turns them into
//! [`runner_core::CapabilityLabels`].

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CloudServerStatus {
    Initializing,
    Running,
    Off,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CloudServer {
    pub id: u64,
    pub name: String,
    pub server_type: String,
    pub location: String,
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
    pub status: CloudServerStatus,
    pub created_at_secs: u64,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NetSpec {
    pub ipv4: bool,
    pub ipv6: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateServerSpec {
    pub name: String,
    pub server_type: String,
    pub location: Option<String>,
    pub image: String,
    pub ssh_key_names: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub net: NetSpec,
    pub user_data: Option<String>,
}

/// Rename + relabel a recyclable server in place, ahead of a rebuild. The
/// server is looked up by `current_name` and ends up as `new_name`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UpdateServerSpec {
    pub current_name: String,
    pub new_name: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SshKey {
    pub name: String,
    pub fingerprint: String,
}
