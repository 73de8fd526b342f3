// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::ScmError;
use crate::model::{RegisteredRunner, WorkflowRun};
use async_trait::async_trait;

/// Everything the Scale-Up/Scale-Down Loops need from the source-control
/// service (§6.2).
#[async_trait]
pub trait SourceControl: Send + Sync + 'static {
    async fn list_queued_workflow_runs(&self) -> Result<Vec<WorkflowRun>, ScmError>;

    async fn list_self_hosted_runners(&self) -> Result<Vec<RegisteredRunner>, ScmError>;

    /// A one-time token the bootstrap protocol exchanges for a runner
    /// registration (§6.3).
    async fn create_registration_token(&self) -> Result<String, ScmError>;

    async fn remove_self_hosted_runner(&self, runner_id: u64) -> Result<(), ScmError>;
}
