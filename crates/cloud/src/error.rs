// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from the cloud provider adapter.
///
/// The Provisioner and Scale-Down Loop branch on a handful of these
/// (`ResourceLimitExceeded` in particular feeds a scale-up failure record),
/// everything else is surfaced as-is.
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("server not found: {0}")]
    NotFound(String),
    #[error("invalid server labels: {0}")]
    InvalidLabels(String),
    #[error("resource_limit_exceeded: {0}")]
    ResourceLimitExceeded(String),
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("cloud provider request failed: {0}")]
    Request(String),
    #[error("cloud provider returned malformed response: {0}")]
    Decode(String),
}

impl CloudError {
    /// Whether the Provisioner should fold this into a scale-up failure
    /// mailbox message rather than just logging and moving on.
    pub fn is_capacity_failure(&self) -> bool {
        matches!(self, Self::ResourceLimitExceeded(_))
    }
}
