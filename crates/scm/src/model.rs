// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source-control entities: queued work and registered runners (§6.2).

use runner_core::label::LabelSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum JobStatus {
    Queued,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Job {
    pub run_id: u64,
    pub job_id: u64,
    pub status: JobStatus,
    pub labels: LabelSet,
    /// Runner that picked up this job, when `status != Queued`.
    pub runner_id: Option<u64>,
    pub runner_name: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WorkflowRun {
    pub run_id: u64,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RegisteredRunnerStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RegisteredRunner {
    pub id: u64,
    pub name: String,
    pub status: RegisteredRunnerStatus,
    pub busy: bool,
    pub labels: LabelSet,
}

impl RegisteredRunner {
    pub fn to_core(&self) -> runner_core::Runner {
        let status = match (self.status, self.busy) {
            (RegisteredRunnerStatus::Online, true) => runner_core::RunnerStatus::OnlineBusy,
            (RegisteredRunnerStatus::Online, false) => runner_core::RunnerStatus::OnlineIdle,
            (RegisteredRunnerStatus::Offline, _) => runner_core::RunnerStatus::Offline,
        };
        runner_core::Runner { id: self.id, name: self.name.clone(), status, labels: self.labels.clone() }
    }
}
