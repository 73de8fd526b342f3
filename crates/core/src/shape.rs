// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Desired Shape: what a job wants its runner's server to look like.

use crate::label::LabelSet;
use serde::{Deserialize, Serialize};

/// Image lookup kind, mirroring the cloud provider's distinction between a
/// name-addressed image (`system`/`app`) and a description-addressed one
/// (`snapshot`/`backup`) — see `image_type` in the original implementation's
/// `args.py`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    System,
    App,
    Snapshot,
    Backup,
}

impl ImageKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Self::System),
            "app" => Some(Self::App),
            "snapshot" => Some(Self::Snapshot),
            "backup" => Some(Self::Backup),
            _ => None,
        }
    }

    /// Whether this kind is looked up by exact name vs. free-text description.
    pub fn is_name_addressed(&self) -> bool {
        matches!(self, Self::System | Self::App)
    }
}

/// A job-requested (or default) image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub architecture: String,
    pub kind: ImageKind,
    pub name: String,
}

/// Network family selection for the provisioned server (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetConfig {
    pub ipv4: bool,
    pub ipv6: bool,
}

impl NetConfig {
    pub const fn both() -> Self {
        Self { ipv4: true, ipv6: true }
    }
}

/// The resolved tuple describing how to provision a server for a given
/// capability label set (§3 Desired Shape, §4.1 Result).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredShape {
    pub server_type: String,
    pub location: Option<String>,
    pub image: ImageRef,
    pub setup_script: String,
    pub startup_script: String,
    pub net_config: NetConfig,
    /// The reduced capability label set that will be stamped on the server.
    pub label_set: LabelSet,
}
