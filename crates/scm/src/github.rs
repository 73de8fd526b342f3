// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production [`SourceControl`] backed by the GitHub REST API.

use crate::error::ScmError;
use crate::model::{
    Job, JobStatus, RegisteredRunner, RegisteredRunnerStatus, WorkflowRun,
};
use crate::provider::SourceControl;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use runner_core::label::label_set;
use serde::Deserialize;
use std::time::Duration;

const API_BASE: &str = "https://api.github.com";

pub struct GithubSourceControl {
    client: reqwest::Client,
    token: String,
    repository: String,
}

impl GithubSourceControl {
    pub fn new(token: String, repository: String) -> Result<Self, ScmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("runner-fleet-controller")
            .build()
            .map_err(|e| ScmError::Request(e.to_string()))?;
        Ok(Self { client, token, repository })
    }

    fn retry_policy() -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(4)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, ScmError> {
        (|| async {
            let response = self
                .client
                .get(format!("{API_BASE}{path}"))
                .bearer_auth(&self.token)
                .header("Accept", "application/vnd.github+json")
                .send()
                .await
                .map_err(|e| ScmError::Request(e.to_string()))?;
            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS
                || response.status() == reqwest::StatusCode::FORBIDDEN
            {
                let retry_after_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1);
                return Err(ScmError::RateLimited { retry_after_secs });
            }
            Ok(response)
        })
        .retry(Self::retry_policy())
        .when(|e| matches!(e, ScmError::RateLimited { .. }))
        .await
    }

    async fn post(&self, path: &str) -> Result<reqwest::Response, ScmError> {
        self.client
            .post(format!("{API_BASE}{path}"))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| ScmError::Request(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct WorkflowRunsWire {
    workflow_runs: Vec<WorkflowRunWire>,
}

#[derive(Debug, Deserialize)]
struct WorkflowRunWire {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JobsWire {
    jobs: Vec<JobWire>,
}

#[derive(Debug, Deserialize)]
struct JobWire {
    id: u64,
    run_id: u64,
    status: String,
    labels: Vec<String>,
    runner_id: Option<u64>,
    runner_name: Option<String>,
}

impl From<JobWire> for Job {
    fn from(wire: JobWire) -> Self {
        let status = match wire.status.as_str() {
            "queued" | "waiting" => JobStatus::Queued,
            "in_progress" => JobStatus::InProgress,
            _ => JobStatus::Completed,
        };
        Job {
            run_id: wire.run_id,
            job_id: wire.id,
            status,
            labels: label_set(wire.labels.iter().map(String::as_str)),
            runner_id: wire.runner_id,
            runner_name: wire.runner_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunnersWire {
    runners: Vec<RunnerWire>,
}

#[derive(Debug, Deserialize)]
struct RunnerWire {
    id: u64,
    name: String,
    status: String,
    busy: bool,
    labels: Vec<RunnerLabelWire>,
}

#[derive(Debug, Deserialize)]
struct RunnerLabelWire {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RegistrationTokenWire {
    token: String,
}

#[async_trait]
impl SourceControl for GithubSourceControl {
    async fn list_queued_workflow_runs(&self) -> Result<Vec<WorkflowRun>, ScmError> {
        let response = self
            .get(&format!("/repos/{}/actions/runs?status=queued", self.repository))
            .await?;
        let wire: WorkflowRunsWire =
            response.json().await.map_err(|e| ScmError::Decode(e.to_string()))?;

        let mut runs = Vec::with_capacity(wire.workflow_runs.len());
        for run in wire.workflow_runs {
            let jobs_response = self
                .get(&format!("/repos/{}/actions/runs/{}/jobs", self.repository, run.id))
                .await?;
            let jobs_wire: JobsWire =
                jobs_response.json().await.map_err(|e| ScmError::Decode(e.to_string()))?;
            runs.push(WorkflowRun {
                run_id: run.id,
                jobs: jobs_wire.jobs.into_iter().map(Into::into).collect(),
            });
        }
        Ok(runs)
    }

    async fn list_self_hosted_runners(&self) -> Result<Vec<RegisteredRunner>, ScmError> {
        let response =
            self.get(&format!("/repos/{}/actions/runners", self.repository)).await?;
        let wire: RunnersWire =
            response.json().await.map_err(|e| ScmError::Decode(e.to_string()))?;
        Ok(wire
            .runners
            .into_iter()
            .map(|r| RegisteredRunner {
                id: r.id,
                name: r.name,
                status: if r.status == "online" {
                    RegisteredRunnerStatus::Online
                } else {
                    RegisteredRunnerStatus::Offline
                },
                busy: r.busy,
                labels: label_set(r.labels.iter().map(|l| l.name.as_str())),
            })
            .collect())
    }

    async fn create_registration_token(&self) -> Result<String, ScmError> {
        let response = self
            .post(&format!("/repos/{}/actions/runners/registration-token", self.repository))
            .await?;
        let wire: RegistrationTokenWire =
            response.json().await.map_err(|e| ScmError::Decode(e.to_string()))?;
        Ok(wire.token)
    }

    async fn remove_self_hosted_runner(&self, runner_id: u64) -> Result<(), ScmError> {
        self.client
            .delete(format!("{API_BASE}/repos/{}/actions/runners/{runner_id}", self.repository))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ScmError::Request(e.to_string()))?;
        Ok(())
    }
}
