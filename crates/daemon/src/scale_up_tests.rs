// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use runner_cloud::{CloudError, CloudServer, CloudServerStatus, FakeCloudProvider};
use runner_core::label::label_set;
use runner_core::resolver::{AllScripts, Defaults};
use runner_core::shape::{ImageKind, ImageRef};
use runner_core::{FakeClock, NamePrefixes};
use runner_provision::FakeBootstrapper;
use runner_scm::{FakeSourceControl, Job, JobStatus, WorkflowRun};
use std::collections::BTreeMap;

fn defaults() -> Defaults {
    Defaults {
        server_type: "cpx11".to_string(),
        location: Some("ash".to_string()),
        image: ImageRef { architecture: "x86".to_string(), kind: ImageKind::System, name: "ubuntu-22.04".to_string() },
        setup_script: "setup.sh".to_string(),
        startup_script_template: "startup-{arch}.sh".to_string(),
        arm_marker: "ca".to_string(),
    }
}

fn loop_with(
    cloud: Arc<FakeCloudProvider>,
    scm: Arc<FakeSourceControl>,
    max_runners: Option<u32>,
    max_runners_in_workflow_run: Option<u32>,
) -> ScaleUpLoop<FakeClock> {
    let label_schema = LabelSchema::new("runner");
    let bootstrapper = Arc::new(FakeBootstrapper::new());
    let provisioner = Arc::new(Provisioner::new(
        cloud.clone(),
        scm.clone(),
        bootstrapper,
        runner_provision::WorkerPool::new(4),
        label_schema.clone(),
        "octo/repo".to_string(),
        Duration::from_secs(60),
    ));
    let recycler = Arc::new(Recycler::new(cloud.clone(), provisioner.clone(), label_schema.clone()));

    ScaleUpLoop {
        cloud,
        scm,
        provisioner,
        recycler,
        label_schema,
        name_prefixes: NamePrefixes::new(""),
        scripts: Arc::new(AllScripts),
        defaults: defaults(),
        meta_labels: MetaLabelMap::new(),
        label_prefix: String::new(),
        required_labels: label_set(["self-hosted"]),
        standby: Vec::new(),
        max_runners_in_workflow_run,
        max_runners,
        ssh_key_name: "fleet-key".to_string(),
        ssh_key_fingerprint: "aa:bb:cc".to_string(),
        mailbox: Mailbox::new(),
        metrics: Metrics::new(),
        clock: FakeClock::new(1_000),
        interval: Duration::from_secs(15),
    }
}

fn queued_job(run_id: u64, job_id: u64, labels: &[&str]) -> WorkflowRun {
    WorkflowRun {
        run_id,
        jobs: vec![Job {
            run_id,
            job_id,
            status: JobStatus::Queued,
            labels: label_set(labels.iter().copied()),
            runner_id: None,
            runner_name: None,
        }],
    }
}

#[tokio::test]
async fn queued_job_triggers_fresh_provision() {
    let cloud = Arc::new(FakeCloudProvider::new(1_000));
    let scm = Arc::new(FakeSourceControl::new());
    scm.set_queued_runs(vec![queued_job(100, 200, &["self-hosted", "type-cpx21", "in-nbg1"])]);

    let loop_ = loop_with(cloud.clone(), scm, None, None);
    loop_.run_once().await.unwrap();

    let server = cloud.server("100-200").expect("server should have been created");
    assert_eq!(server.server_type, "cpx21");
    assert_eq!(server.location, "nbg1");
    let labels = loop_.label_schema.decode(&server.labels);
    assert!(labels.contains("self-hosted"));
    assert!(labels.contains("type-cpx21"));
    assert!(labels.contains("in-nbg1"));
}

#[tokio::test]
async fn recycle_path_reuses_matching_server_instead_of_creating_one() {
    let cloud = Arc::new(FakeCloudProvider::new(1_000));
    let scm = Arc::new(FakeSourceControl::new());

    let label_schema = LabelSchema::new("runner");
    let mut labels = label_schema.encode(&label_set(["self-hosted"]), "aa:bb:cc");
    labels.insert(label_schema.active_key.clone(), "active".to_string());
    cloud.seed_server(CloudServer {
        id: 1,
        name: "recycle-abc123".to_string(),
        server_type: "cpx21".to_string(),
        location: "nbg1".to_string(),
        ipv4: Some("10.0.0.5".to_string()),
        ipv6: None,
        status: CloudServerStatus::Off,
        created_at_secs: 900,
        labels,
    });

    scm.set_queued_runs(vec![queued_job(
        100,
        200,
        &["self-hosted", "type-cpx21", "in-nbg1", "net-ipv4"],
    )]);

    let loop_ = loop_with(cloud.clone(), scm, None, None);
    loop_.run_once().await.unwrap();

    assert!(cloud.server("recycle-abc123").is_none(), "recyclable should have been renamed away");
    let server = cloud.server("100-200").expect("recycled server should now carry the job name");
    assert!(cloud.calls().iter().any(|c| matches!(c, runner_cloud::CloudCall::Update(_))));
    assert!(cloud.calls().iter().any(|c| matches!(c, runner_cloud::CloudCall::Rebuild(_))));
    assert!(!cloud.calls().iter().any(|c| matches!(c, runner_cloud::CloudCall::Create(n) if n == "100-200")));
    assert_eq!(server.server_type, "cpx21");
}

#[tokio::test]
async fn exhausted_global_cap_posts_mailbox_failure_instead_of_creating() {
    let cloud = Arc::new(FakeCloudProvider::new(1_000));
    let scm = Arc::new(FakeSourceControl::new());

    for (run_id, job_id) in [(1, 1), (2, 2)] {
        let mut labels = BTreeMap::new();
        labels.insert("runner".to_string(), "active".to_string());
        cloud.seed_server(CloudServer {
            id: run_id,
            name: format!("{run_id}-{job_id}"),
            server_type: "cpx11".to_string(),
            location: "ash".to_string(),
            ipv4: Some("10.0.0.9".to_string()),
            ipv6: None,
            status: CloudServerStatus::Running,
            created_at_secs: 900,
            labels,
        });
    }

    scm.set_queued_runs(vec![queued_job(100, 200, &["self-hosted"])]);

    let loop_ = loop_with(cloud.clone(), scm, Some(2), None);
    loop_.run_once().await.unwrap();

    assert!(!cloud.calls().iter().any(|c| matches!(c, runner_cloud::CloudCall::Create(_))));
    let aggregated = loop_.mailbox.drain_aggregated();
    assert_eq!(aggregated.len(), 1);
    let record = aggregated.values().next().unwrap();
    assert_eq!(record.count, 1);
}

#[tokio::test]
async fn resource_limit_exceeded_on_create_is_posted_to_the_mailbox() {
    let cloud = Arc::new(FakeCloudProvider::new(1_000));
    let scm = Arc::new(FakeSourceControl::new());
    scm.set_queued_runs(vec![queued_job(100, 200, &["self-hosted"])]);
    cloud.fail_next_create(CloudError::ResourceLimitExceeded("quota".to_string()));

    let loop_ = loop_with(cloud.clone(), scm, None, None);
    loop_.run_once().await.unwrap();

    let aggregated = loop_.mailbox.drain_aggregated();
    assert_eq!(aggregated.len(), 1);
}
