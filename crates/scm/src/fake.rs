// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::ScmError;
use crate::model::{RegisteredRunner, WorkflowRun};
use crate::provider::SourceControl;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    queued_runs: Vec<WorkflowRun>,
    runners: Vec<RegisteredRunner>,
    removed_runner_ids: Vec<u64>,
    registration_tokens_issued: u32,
}

#[derive(Clone, Default)]
pub struct FakeSourceControl {
    inner: Arc<Mutex<Inner>>,
}

impl FakeSourceControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_queued_runs(&self, runs: Vec<WorkflowRun>) {
        self.inner.lock().queued_runs = runs;
    }

    pub fn set_runners(&self, runners: Vec<RegisteredRunner>) {
        self.inner.lock().runners = runners;
    }

    pub fn removed_runner_ids(&self) -> Vec<u64> {
        self.inner.lock().removed_runner_ids.clone()
    }

    pub fn registration_tokens_issued(&self) -> u32 {
        self.inner.lock().registration_tokens_issued
    }
}

#[async_trait]
impl SourceControl for FakeSourceControl {
    async fn list_queued_workflow_runs(&self) -> Result<Vec<WorkflowRun>, ScmError> {
        Ok(self.inner.lock().queued_runs.clone())
    }

    async fn list_self_hosted_runners(&self) -> Result<Vec<RegisteredRunner>, ScmError> {
        Ok(self.inner.lock().runners.clone())
    }

    async fn create_registration_token(&self) -> Result<String, ScmError> {
        let mut inner = self.inner.lock();
        inner.registration_tokens_issued += 1;
        Ok(format!("fake-token-{}", inner.registration_tokens_issued))
    }

    async fn remove_self_hosted_runner(&self, runner_id: u64) -> Result<(), ScmError> {
        self.inner.lock().removed_runner_ids.push(runner_id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
