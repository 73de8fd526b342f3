// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Runner entity: a registered worker in the source-control service
//! (§3).

use crate::label::LabelSet;
use serde::{Deserialize, Serialize};

/// `{online, offline} x {busy, idle}` (§3 Runner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunnerStatus {
    OnlineIdle,
    OnlineBusy,
    Offline,
}

impl RunnerStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, Self::OnlineIdle | Self::OnlineBusy)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::OnlineBusy)
    }

    /// `online && !busy` or `offline` (§4.5 step 2 unused candidate test).
    pub fn is_unused_candidate(&self) -> bool {
        matches!(self, Self::OnlineIdle | Self::Offline)
    }
}

/// A self-hosted runner as observed from the source-control service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    pub id: u64,
    pub name: String,
    pub status: RunnerStatus,
    pub labels: LabelSet,
}

impl Runner {
    /// A server is "runner-bearing" when a runner's name starts with the
    /// server's name (§3 Runner).
    pub fn belongs_to_server(&self, server_name: &str) -> bool {
        self.name.starts_with(server_name)
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
