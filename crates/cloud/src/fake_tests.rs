// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::model::NetSpec;
use std::collections::BTreeMap;

fn net() -> NetSpec {
    NetSpec { ipv4: true, ipv6: true }
}

#[tokio::test]
async fn create_then_get_by_name_round_trips() {
    let provider = FakeCloudProvider::new(1_700_000_000);
    let spec = CreateServerSpec {
        name: "runner-100-200-abcdef".to_string(),
        server_type: "cx22".to_string(),
        location: Some("nbg1".to_string()),
        image: "ubuntu-24.04".to_string(),
        ssh_key_names: vec!["fleet-key".to_string()],
        labels: BTreeMap::new(),
        net: net(),
        user_data: None,
    };
    let created = provider.create_server(spec).await.unwrap();
    let fetched = provider.get_server_by_name("runner-100-200-abcdef").await.unwrap().unwrap();
    assert_eq!(created.id, fetched.id);
    assert_eq!(provider.calls(), vec![CloudCall::Create("runner-100-200-abcdef".to_string())]);
}

#[tokio::test]
async fn create_can_be_scripted_to_fail() {
    let provider = FakeCloudProvider::new(1_700_000_000);
    provider.fail_next_create(CloudError::ResourceLimitExceeded("account cap".to_string()));
    let spec = CreateServerSpec {
        name: "runner-1-1-aaaaaa".to_string(),
        server_type: "cx22".to_string(),
        location: None,
        image: "ubuntu-24.04".to_string(),
        ssh_key_names: vec![],
        labels: BTreeMap::new(),
        net: net(),
        user_data: None,
    };
    let err = provider.create_server(spec).await.unwrap_err();
    assert!(err.is_capacity_failure());
}

#[tokio::test]
async fn update_server_renames_and_relabels() {
    let provider = FakeCloudProvider::new(1_700_000_000);
    provider
        .create_server(CreateServerSpec {
            name: "runner-recycle-1".to_string(),
            server_type: "cx22".to_string(),
            location: None,
            image: "ubuntu-24.04".to_string(),
            ssh_key_names: vec![],
            labels: BTreeMap::new(),
            net: net(),
            user_data: None,
        })
        .await
        .unwrap();

    let mut labels = BTreeMap::new();
    labels.insert("github-hetzner-runner-label-0".to_string(), "self-hosted".to_string());
    let updated = provider
        .update_server(UpdateServerSpec {
            current_name: "runner-recycle-1".to_string(),
            new_name: "runner-100-200-abcdef".to_string(),
            labels,
        })
        .await
        .unwrap();

    assert_eq!(updated.name, "runner-100-200-abcdef");
    assert!(provider.get_server_by_name("runner-recycle-1").await.unwrap().is_none());
    assert!(provider.get_server_by_name("runner-100-200-abcdef").await.unwrap().is_some());
}

#[tokio::test]
async fn missing_price_data_is_none() {
    let provider = FakeCloudProvider::new(1_700_000_000);
    assert_eq!(provider.hourly_price("cx22", "nbg1").await.unwrap(), None);
    provider.seed_price("cx22", "nbg1", 0.0084);
    assert_eq!(provider.hourly_price("cx22", "nbg1").await.unwrap(), Some(0.0084));
}
