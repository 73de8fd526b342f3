// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Failures from a single `provision()` attempt (§4.2).
///
/// `MaxNumberOfServersReached` and `ResourceLimitExceeded` are the two
/// "recoverable by recycling" kinds the Scale-Up Loop queues into the
/// mailbox; everything else is terminal for the attempt and only logged.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid server labels: {0}")]
    InvalidLabels(String),
    #[error("maximum number of servers reached")]
    MaxNumberOfServersReached,
    #[error("resource_limit_exceeded: {0}")]
    ResourceLimitExceeded(String),
    #[error("cloud provider error: {0}")]
    Cloud(#[from] runner_cloud::CloudError),
}

impl ProvisionError {
    pub fn is_mailbox_worthy(&self) -> bool {
        matches!(self, Self::MaxNumberOfServersReached | Self::ResourceLimitExceeded(_))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("server did not become SSH-ready within the deadline")]
    SshTimeout,
    #[error("failed to obtain a runner registration token: {0}")]
    RegistrationToken(#[from] runner_scm::ScmError),
    #[error("setup script failed: {0}")]
    SetupScript(String),
    #[error("startup script failed: {0}")]
    StartupScript(String),
}
