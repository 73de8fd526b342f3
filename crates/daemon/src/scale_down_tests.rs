// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use runner_cloud::{CloudCall, CloudServer, CloudServerStatus, FakeCloudProvider};
use runner_core::failure::{MailboxMessage, ScaleUpFailureKind};
use runner_core::label::label_set;
use runner_core::FakeClock;
use runner_scm::{FakeSourceControl, RegisteredRunner, RegisteredRunnerStatus};
use std::collections::BTreeMap;

fn schema() -> LabelSchema {
    LabelSchema::new("runner")
}

fn loop_with(
    cloud: Arc<FakeCloudProvider>,
    scm: Arc<FakeSourceControl>,
    standby: Vec<StandbyDeclaration>,
    recycle: bool,
) -> ScaleDownLoop<FakeClock> {
    ScaleDownLoop::new(
        cloud,
        scm,
        schema(),
        NamePrefixes::new(""),
        standby,
        "aa:bb:cc".to_string(),
        Mailbox::new(),
        Metrics::new(),
        FakeClock::new(1_000),
        Duration::from_secs(30),
        Duration::from_secs(300),
        Duration::from_secs(300),
        Duration::from_secs(300),
        50,
        recycle,
    )
}

fn powered_off_server(name: &str, ssh_key: &str) -> CloudServer {
    let mut labels = BTreeMap::new();
    labels.insert("runner".to_string(), "active".to_string());
    labels.insert("runner-ssh-key".to_string(), ssh_key.to_string());
    CloudServer {
        id: 1,
        name: name.to_string(),
        server_type: "cpx11".to_string(),
        location: "nbg1".to_string(),
        ipv4: Some("10.0.0.1".to_string()),
        ipv6: None,
        status: CloudServerStatus::Off,
        created_at_secs: 1_000,
        labels,
    }
}

fn running_server(name: &str, ssh_key: &str) -> CloudServer {
    CloudServer { status: CloudServerStatus::Running, ..powered_off_server(name, ssh_key) }
}

#[tokio::test]
async fn powered_off_server_is_recycled_after_the_threshold_elapses() {
    let cloud = Arc::new(FakeCloudProvider::new(1_000));
    cloud.seed_server(powered_off_server("100-200", "aa:bb:cc"));
    let scm = Arc::new(FakeSourceControl::new());
    let mut loop_ = loop_with(cloud.clone(), scm, Vec::new(), true);

    loop_.run_once().await.unwrap();
    assert!(cloud.calls().is_empty(), "should not act before the threshold elapses");

    loop_.clock.advance(301);
    loop_.run_once().await.unwrap();

    assert!(cloud.server("100-200").is_none());
    assert!(cloud.calls().iter().any(|c| matches!(c, CloudCall::PowerOff(n) if n == "100-200")));
    assert!(cloud.calls().iter().any(|c| matches!(c, CloudCall::Update(n) if n.starts_with("recycle-"))));
}

#[tokio::test]
async fn powered_off_server_is_deleted_outright_when_recycle_is_disabled() {
    let cloud = Arc::new(FakeCloudProvider::new(1_000));
    cloud.seed_server(powered_off_server("100-200", "aa:bb:cc"));
    let scm = Arc::new(FakeSourceControl::new());
    let mut loop_ = loop_with(cloud.clone(), scm, Vec::new(), false);

    loop_.run_once().await.unwrap();
    loop_.clock.advance(301);
    loop_.run_once().await.unwrap();

    assert!(cloud.server("100-200").is_none());
    assert!(cloud.calls().iter().any(|c| matches!(c, CloudCall::Delete(n) if n == "100-200")));
    assert!(!cloud.calls().iter().any(|c| matches!(c, CloudCall::PowerOff(_))));
}

#[tokio::test]
async fn powered_off_server_with_mismatched_ssh_key_is_deleted_despite_recycle_on() {
    let cloud = Arc::new(FakeCloudProvider::new(1_000));
    cloud.seed_server(powered_off_server("100-200", "zz:zz:zz"));
    let scm = Arc::new(FakeSourceControl::new());
    let mut loop_ = loop_with(cloud.clone(), scm, Vec::new(), true);

    loop_.run_once().await.unwrap();
    loop_.clock.advance(301);
    loop_.run_once().await.unwrap();

    assert!(cloud.calls().iter().any(|c| matches!(c, CloudCall::Delete(n) if n == "100-200")));
    assert!(!cloud.calls().iter().any(|c| matches!(c, CloudCall::Update(_))));
}

#[tokio::test]
async fn zombie_server_is_recycled_after_the_registration_window() {
    let cloud = Arc::new(FakeCloudProvider::new(1_000));
    cloud.seed_server(running_server("100-200", "aa:bb:cc"));
    let scm = Arc::new(FakeSourceControl::new());
    let mut loop_ = loop_with(cloud.clone(), scm, Vec::new(), true);

    loop_.run_once().await.unwrap();
    loop_.clock.advance(301);
    loop_.run_once().await.unwrap();

    assert!(cloud.server("100-200").is_none());
    assert!(cloud.calls().iter().any(|c| matches!(c, CloudCall::PowerOff(n) if n == "100-200")));
}

#[tokio::test]
async fn unused_runner_with_a_server_is_deleted_and_deregistered_when_recycle_is_off() {
    let cloud = Arc::new(FakeCloudProvider::new(1_000));
    cloud.seed_server(running_server("100-200", "aa:bb:cc"));
    let scm = Arc::new(FakeSourceControl::new());
    scm.set_runners(vec![RegisteredRunner {
        id: 42,
        name: "100-200-abcd".to_string(),
        status: RegisteredRunnerStatus::Online,
        busy: false,
        labels: label_set(["self-hosted"]),
    }]);
    let mut loop_ = loop_with(cloud.clone(), scm.clone(), Vec::new(), false);

    loop_.run_once().await.unwrap();
    loop_.clock.advance(301);
    loop_.run_once().await.unwrap();

    assert!(cloud.calls().iter().any(|c| matches!(c, CloudCall::Delete(n) if n == "100-200")));
    assert_eq!(scm.removed_runner_ids(), vec![42]);
}

#[tokio::test]
async fn standby_declaration_absorbs_an_idle_runner_and_prevents_any_action() {
    let cloud = Arc::new(FakeCloudProvider::new(1_000));
    cloud.seed_server(running_server("100-200", "aa:bb:cc"));
    let scm = Arc::new(FakeSourceControl::new());
    scm.set_runners(vec![RegisteredRunner {
        id: 42,
        name: "100-200-abcd".to_string(),
        status: RegisteredRunnerStatus::Online,
        busy: false,
        labels: label_set(["self-hosted"]),
    }]);
    let standby = vec![StandbyDeclaration::new(label_set(["self-hosted"]), 1, false)];
    let mut loop_ = loop_with(cloud.clone(), scm.clone(), standby, false);

    loop_.run_once().await.unwrap();
    loop_.clock.advance(301);
    loop_.run_once().await.unwrap();

    assert!(cloud.calls().is_empty());
    assert!(scm.removed_runner_ids().is_empty());
}

#[tokio::test]
async fn mailbox_failure_is_forgotten_once_matching_capacity_exists() {
    let cloud = Arc::new(FakeCloudProvider::new(1_000));
    let mut labels = BTreeMap::new();
    labels.insert("runner".to_string(), "active".to_string());
    labels.insert("runner-label-0".to_string(), "self-hosted".to_string());
    cloud.seed_server(CloudServer { status: CloudServerStatus::Running, labels, ..powered_off_server("900-1", "aa:bb:cc") });
    let scm = Arc::new(FakeSourceControl::new());
    let mut loop_ = loop_with(cloud.clone(), scm, Vec::new(), true);
    loop_.mailbox.post(MailboxMessage {
        at_secs: 1_000,
        labels: label_set(["self-hosted"]),
        server_name: "100-200".to_string(),
        kind: ScaleUpFailureKind::MaxNumberOfServersReached,
        detail: "cap reached".to_string(),
    });

    loop_.run_once().await.unwrap();

    assert!(loop_.failures.is_empty());
}

#[tokio::test]
async fn mailbox_failure_is_forgotten_immediately_when_there_is_no_recyclable_to_sacrifice() {
    let cloud = Arc::new(FakeCloudProvider::new(1_000));
    let scm = Arc::new(FakeSourceControl::new());
    let mut loop_ = loop_with(cloud.clone(), scm, Vec::new(), true);
    loop_.mailbox.post(MailboxMessage {
        at_secs: 1_000,
        labels: label_set(["self-hosted"]),
        server_name: "100-200".to_string(),
        kind: ScaleUpFailureKind::MaxNumberOfServersReached,
        detail: "cap reached".to_string(),
    });

    loop_.run_once().await.unwrap();

    assert!(loop_.failures.is_empty());
}

#[tokio::test]
async fn mailbox_failure_survives_at_count_two_until_resolved_or_escalated() {
    let cloud = Arc::new(FakeCloudProvider::new(1_000));
    cloud.seed_server(powered_off_server("recycle-abc", "aa:bb:cc"));
    let scm = Arc::new(FakeSourceControl::new());
    let mut loop_ = loop_with(cloud.clone(), scm, Vec::new(), true);

    for _ in 0..2 {
        loop_.mailbox.post(MailboxMessage {
            at_secs: loop_.clock.now_secs(),
            labels: label_set(["self-hosted"]),
            server_name: "100-200".to_string(),
            kind: ScaleUpFailureKind::MaxNumberOfServersReached,
            detail: "cap reached".to_string(),
        });
    }

    loop_.clock.advance(61);
    loop_.run_once().await.unwrap();

    assert_eq!(loop_.failures.len(), 1);
    assert_eq!(loop_.failures.get("100-200").unwrap().count, 2);
    assert!(cloud.server("recycle-abc").is_some(), "count == 2 must not sacrifice a recyclable");
}

#[tokio::test]
async fn mailbox_failure_past_count_two_and_old_enough_deletes_a_recyclable() {
    let cloud = Arc::new(FakeCloudProvider::new(1_000));
    cloud.seed_server(powered_off_server("recycle-abc", "aa:bb:cc"));
    let scm = Arc::new(FakeSourceControl::new());
    let mut loop_ = loop_with(cloud.clone(), scm, Vec::new(), true);

    for _ in 0..3 {
        loop_.mailbox.post(MailboxMessage {
            at_secs: loop_.clock.now_secs(),
            labels: label_set(["self-hosted"]),
            server_name: "100-200".to_string(),
            kind: ScaleUpFailureKind::MaxNumberOfServersReached,
            detail: "cap reached".to_string(),
        });
    }

    loop_.clock.advance(61);
    loop_.run_once().await.unwrap();

    assert!(loop_.failures.is_empty());
    assert!(cloud.server("recycle-abc").is_none());
    assert!(cloud.calls().iter().any(|c| matches!(c, CloudCall::Delete(n) if n == "recycle-abc")));
}
