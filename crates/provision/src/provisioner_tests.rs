// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::bootstrap::fake::FakeBootstrapper;
use runner_cloud::{CloudCall, FakeCloudProvider};
use runner_core::label::label_set;
use runner_core::shape::{ImageKind, ImageRef, NetConfig};
use runner_scm::FakeSourceControl;
use std::time::Duration;

fn shape() -> DesiredShape {
    DesiredShape {
        server_type: "cx22".to_string(),
        location: None,
        image: ImageRef { architecture: "x64".to_string(), kind: ImageKind::System, name: "ubuntu-24.04".to_string() },
        setup_script: "setup".to_string(),
        startup_script: "startup_x64".to_string(),
        net_config: NetConfig::both(),
        label_set: label_set(["self-hosted", "x64"]),
    }
}

fn provisioner(
    cloud: FakeCloudProvider,
    scm: FakeSourceControl,
    bootstrapper: FakeBootstrapper,
) -> Provisioner {
    Provisioner::new(
        Arc::new(cloud),
        Arc::new(scm),
        Arc::new(bootstrapper),
        WorkerPool::new(4),
        LabelSchema::new("runner"),
        "octo/repo".to_string(),
        Duration::from_secs(60),
    )
}

#[tokio::test]
async fn provision_creates_server_and_submits_bootstrap() {
    let cloud = FakeCloudProvider::new(1_700_000_000);
    let scm = FakeSourceControl::new();
    let bootstrapper = FakeBootstrapper::new();
    let provisioner = provisioner(cloud.clone(), scm.clone(), bootstrapper.clone());

    provisioner
        .provision("runner-1-1-aaaaaa", &shape(), "fleet-key", "aa:bb:cc")
        .await
        .unwrap();

    assert_eq!(cloud.calls(), vec![CloudCall::Create("runner-1-1-aaaaaa".to_string())]);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(scm.registration_tokens_issued(), 1);
    assert!(!bootstrapper.calls().is_empty());
}

#[tokio::test]
async fn resource_limit_exceeded_is_classified_as_such() {
    let cloud = FakeCloudProvider::new(1_700_000_000);
    cloud.fail_next_create(runner_cloud::CloudError::ResourceLimitExceeded("cap".to_string()));
    let provisioner = provisioner(cloud, FakeSourceControl::new(), FakeBootstrapper::new());

    let err = provisioner
        .provision("runner-1-1-aaaaaa", &shape(), "fleet-key", "aa:bb:cc")
        .await
        .unwrap_err();
    assert!(matches!(err, ProvisionError::ResourceLimitExceeded(_)));
    assert!(err.is_mailbox_worthy());
}

#[tokio::test]
async fn encoded_labels_carry_ssh_key_fingerprint_and_active_marker() {
    let cloud = FakeCloudProvider::new(1_700_000_000);
    let provisioner =
        provisioner(cloud.clone(), FakeSourceControl::new(), FakeBootstrapper::new());

    provisioner
        .provision("runner-1-1-aaaaaa", &shape(), "fleet-key", "aa:bb:cc")
        .await
        .unwrap();

    let server = cloud.server("runner-1-1-aaaaaa").unwrap();
    assert_eq!(server.labels.get("runner"), Some(&"active".to_string()));
    assert_eq!(server.labels.get("runner-ssh-key"), Some(&"aa:bb:cc".to_string()));
}
