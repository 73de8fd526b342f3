// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server name encodings (§6.4).
//!
//! A server's name prefix is the single source of truth for its role; the
//! Invariants section of §3 requires that a server never change role except
//! through the recycling transition, which rewrites the name at the same
//! time.

use serde::{Deserialize, Serialize};

/// The role implied by a server's name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerRole {
    /// `<runner-prefix><run_id>-<job_id>`
    Job,
    /// `<runner-prefix>standby-<uid>`
    Standby,
    /// `<runner-prefix>recycle-<uid>`
    Recyclable,
}

/// Configured name prefixes. `runner_prefix` defaults to the controller's
/// own marker (e.g. `"github-hetzner-runner-"` in the original
/// implementation); `standby`/`recycle` are always derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePrefixes {
    pub runner: String,
}

impl NamePrefixes {
    pub fn new(runner_prefix: impl Into<String>) -> Self {
        Self { runner: runner_prefix.into() }
    }

    pub fn standby_prefix(&self) -> String {
        format!("{}standby-", self.runner)
    }

    pub fn recycle_prefix(&self) -> String {
        format!("{}recycle-", self.runner)
    }

    pub fn job_server_name(&self, run_id: u64, job_id: u64) -> String {
        format!("{}{run_id}-{job_id}", self.runner)
    }

    /// Prefix shared by every job-server name belonging to `run_id`, used by
    /// the Scale-Up Loop's per-workflow-run cap check (§4.4 step 3).
    pub fn run_id_prefix(&self, run_id: u64) -> String {
        format!("{}{run_id}-", self.runner)
    }

    pub fn standby_server_name(&self, uid: &str) -> String {
        format!("{}{uid}", self.standby_prefix())
    }

    pub fn recycle_server_name(&self, uid: &str) -> String {
        format!("{}{uid}", self.recycle_prefix())
    }

    /// Classify a server name by its prefix, per the Invariants in §3.
    pub fn role_of(&self, server_name: &str) -> Option<ServerRole> {
        if server_name.starts_with(&self.standby_prefix()) {
            Some(ServerRole::Standby)
        } else if server_name.starts_with(&self.recycle_prefix()) {
            Some(ServerRole::Recyclable)
        } else if server_name.starts_with(&self.runner) {
            Some(ServerRole::Job)
        } else {
            None
        }
    }

    pub fn is_managed(&self, server_name: &str) -> bool {
        server_name.starts_with(&self.runner)
    }
}

impl Default for NamePrefixes {
    fn default() -> Self {
        Self::new("runner-")
    }
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod tests;
