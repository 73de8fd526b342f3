// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Standby pool declarations (§3 Standby Declaration).

use crate::label::LabelSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandbyDeclaration {
    pub labels: LabelSet,
    pub count: u32,
    /// When true, the pool counts only runners in a state available-now
    /// (STARTING not OFF, status in {initializing, ready}); otherwise it
    /// counts all present servers of that shape.
    pub replenish_immediately: bool,
}

impl StandbyDeclaration {
    pub fn new(labels: LabelSet, count: u32, replenish_immediately: bool) -> Self {
        Self { labels, count, replenish_immediately }
    }
}

#[cfg(test)]
#[path = "standby_tests.rs"]
mod tests;
