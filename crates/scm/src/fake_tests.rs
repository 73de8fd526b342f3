// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::model::{Job, JobStatus};
use runner_core::label::label_set;

#[tokio::test]
async fn seeded_runs_and_runners_are_returned_verbatim() {
    let scm = FakeSourceControl::new();
    scm.set_queued_runs(vec![WorkflowRun {
        run_id: 42,
        jobs: vec![Job {
            run_id: 42,
            job_id: 1,
            status: JobStatus::Queued,
            labels: label_set(["self-hosted", "x64"]),
            runner_id: None,
            runner_name: None,
        }],
    }]);

    let runs = scm.list_queued_workflow_runs().await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].jobs[0].job_id, 1);
}

#[tokio::test]
async fn remove_runner_is_recorded() {
    let scm = FakeSourceControl::new();
    scm.remove_self_hosted_runner(7).await.unwrap();
    assert_eq!(scm.removed_runner_ids(), vec![7]);
}

#[tokio::test]
async fn registration_tokens_increment() {
    let scm = FakeSourceControl::new();
    scm.create_registration_token().await.unwrap();
    scm.create_registration_token().await.unwrap();
    assert_eq!(scm.registration_tokens_issued(), 2);
}
