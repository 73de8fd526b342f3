// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use runner_cloud::{CloudServer, CloudServerStatus, FakeCloudProvider};
use runner_core::label::label_set;
use runner_scm::{FakeSourceControl, RegisteredRunner, RegisteredRunnerStatus};
use std::collections::BTreeMap;

fn prefixes() -> NamePrefixes {
    NamePrefixes::new("runner-")
}

fn server(name: &str, status: CloudServerStatus) -> CloudServer {
    CloudServer {
        id: 1,
        name: name.to_string(),
        server_type: "cpx11".to_string(),
        location: "nbg1".to_string(),
        ipv4: Some("10.0.0.5".to_string()),
        ipv6: None,
        status,
        created_at_secs: 0,
        labels: BTreeMap::new(),
    }
}

#[tokio::test]
async fn list_ignores_servers_outside_the_managed_namespace() {
    let fake = FakeCloudProvider::new(0);
    fake.seed_server(server("runner-standby-abc", CloudServerStatus::Running));
    fake.seed_server(server("unrelated-box", CloudServerStatus::Running));
    let cloud: Arc<dyn runner_cloud::CloudProvider> = Arc::new(fake);

    let managed = managed_servers(&cloud, &prefixes()).await.unwrap();
    assert_eq!(managed.len(), 1);
    assert_eq!(managed[0].name, "runner-standby-abc");
}

#[tokio::test]
async fn ssh_command_rejects_a_server_that_is_not_running() {
    let fake = FakeCloudProvider::new(0);
    fake.seed_server(server("runner-standby-abc", CloudServerStatus::Off));
    let cloud: Arc<dyn runner_cloud::CloudProvider> = Arc::new(fake);

    let err = ssh_command(&cloud, "runner-standby-abc").await.unwrap_err();
    assert!(matches!(err, CliError::ServerNotRunning { .. }));
}

#[tokio::test]
async fn ssh_command_rejects_a_server_that_does_not_exist() {
    let cloud: Arc<dyn runner_cloud::CloudProvider> = Arc::new(FakeCloudProvider::new(0));
    let err = ssh_command(&cloud, "runner-standby-missing").await.unwrap_err();
    assert!(matches!(err, CliError::ServerNotFound(_)));
}

#[tokio::test]
async fn ssh_command_prints_the_running_server_address() {
    let fake = FakeCloudProvider::new(0);
    fake.seed_server(server("runner-standby-abc", CloudServerStatus::Running));
    let cloud: Arc<dyn runner_cloud::CloudProvider> = Arc::new(fake);

    let address = resolve_running_server_address(&cloud, "runner-standby-abc").await.unwrap();
    assert_eq!(address, "10.0.0.5");
}

#[tokio::test]
async fn delete_all_only_touches_managed_servers_and_runners() {
    let fake_cloud = FakeCloudProvider::new(0);
    fake_cloud.seed_server(server("runner-standby-abc", CloudServerStatus::Running));
    fake_cloud.seed_server(server("unrelated-box", CloudServerStatus::Running));
    let cloud: Arc<dyn runner_cloud::CloudProvider> = Arc::new(fake_cloud.clone());

    let fake_scm = FakeSourceControl::new();
    fake_scm.set_runners(vec![
        RegisteredRunner {
            id: 1,
            name: "runner-standby-abc".to_string(),
            status: RegisteredRunnerStatus::Online,
            busy: false,
            labels: label_set(["self-hosted"].into_iter()),
        },
        RegisteredRunner {
            id: 2,
            name: "some-other-runner".to_string(),
            status: RegisteredRunnerStatus::Online,
            busy: false,
            labels: label_set(["self-hosted"].into_iter()),
        },
    ]);
    let scm: Arc<dyn runner_scm::SourceControl> = Arc::new(fake_scm.clone());

    delete_all(&cloud, &scm, &prefixes()).await.unwrap();

    assert!(fake_cloud.server("runner-standby-abc").is_none());
    assert!(fake_cloud.server("unrelated-box").is_some());
    assert_eq!(fake_scm.removed_runner_ids(), vec![1]);
}
