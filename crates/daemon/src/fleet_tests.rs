// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use runner_cloud::{CloudServer, CloudServerStatus, FakeCloudProvider};
use runner_core::label::label_set;
use runner_scm::{FakeSourceControl, RegisteredRunner, RegisteredRunnerStatus};
use std::collections::BTreeMap;

fn schema() -> LabelSchema {
    LabelSchema::new("runner")
}

fn active_server(name: &str) -> CloudServer {
    let mut labels = BTreeMap::new();
    labels.insert("runner".to_string(), "active".to_string());
    CloudServer {
        id: 1,
        name: name.to_string(),
        server_type: "cpx11".to_string(),
        location: "nbg1".to_string(),
        ipv4: Some("10.0.0.1".to_string()),
        ipv6: None,
        status: CloudServerStatus::Running,
        created_at_secs: 1_000,
        labels,
    }
}

#[tokio::test]
async fn inactive_servers_are_excluded() {
    let cloud = FakeCloudProvider::new(1_000);
    let mut labels = BTreeMap::new();
    labels.insert("other".to_string(), "value".to_string());
    cloud.seed_server(CloudServer { labels, ..active_server("runner-100-200") });
    let scm = FakeSourceControl::new();

    let fleet = snapshot(&cloud, &scm, &schema()).await.unwrap();
    assert!(fleet.servers.is_empty());
    assert!(fleet.raw_servers.is_empty());
}

#[tokio::test]
async fn server_status_is_annotated_from_matching_runner() {
    let cloud = FakeCloudProvider::new(1_000);
    cloud.seed_server(active_server("runner-100-200"));
    let scm = FakeSourceControl::new();
    scm.set_runners(vec![RegisteredRunner {
        id: 1,
        name: "runner-100-200-abcd".to_string(),
        status: RegisteredRunnerStatus::Online,
        busy: true,
        labels: label_set(["self-hosted"]),
    }]);

    let fleet = snapshot(&cloud, &scm, &schema()).await.unwrap();
    assert_eq!(fleet.servers.len(), 1);
    assert_eq!(fleet.servers[0].status, Some(ServerStatus::Busy));
}

#[tokio::test]
async fn server_without_a_matching_runner_is_initializing() {
    let cloud = FakeCloudProvider::new(1_000);
    cloud.seed_server(active_server("runner-100-200"));
    let scm = FakeSourceControl::new();

    let fleet = snapshot(&cloud, &scm, &schema()).await.unwrap();
    assert_eq!(fleet.servers[0].status, Some(ServerStatus::Initializing));
}
