// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`CloudProvider`] for tests, mirroring the fake agent adapter
//! pattern used elsewhere in this workspace.

use crate::error::CloudError;
use crate::model::{CloudServer, CloudServerStatus, CreateServerSpec, SshKey, UpdateServerSpec};
use crate::provider::CloudProvider;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum CloudCall {
    Create(String),
    Update(String),
    Rebuild(String),
    PowerOff(String),
    Delete(String),
}

#[derive(Default)]
struct Inner {
    servers: BTreeMap<String, CloudServer>,
    ssh_keys: BTreeMap<String, SshKey>,
    prices: BTreeMap<(String, String), f64>,
    calls: Vec<CloudCall>,
    next_id: u64,
}

/// An in-memory fleet the tests can script: pre-seed servers and ssh keys,
/// then assert on `calls()` after running the Provisioner/Recycler/loops
/// against it.
#[derive(Clone)]
pub struct FakeCloudProvider {
    inner: Arc<Mutex<Inner>>,
    clock_secs: Arc<AtomicU64>,
    /// When set, `create_server` fails with this error instead of succeeding
    /// — used to exercise the max-servers/resource-limit failure paths.
    fail_create_with: Arc<Mutex<Option<CloudError>>>,
}

impl FakeCloudProvider {
    pub fn new(now_secs: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            clock_secs: Arc::new(AtomicU64::new(now_secs)),
            fail_create_with: Arc::new(Mutex::new(None)),
        }
    }

    pub fn seed_server(&self, server: CloudServer) {
        self.inner.lock().servers.insert(server.name.clone(), server);
    }

    pub fn seed_ssh_key(&self, name: &str, fingerprint: &str) {
        self.inner
            .lock()
            .ssh_keys
            .insert(name.to_string(), SshKey { name: name.to_string(), fingerprint: fingerprint.to_string() });
    }

    pub fn seed_price(&self, server_type: &str, location: &str, hourly: f64) {
        self.inner.lock().prices.insert((server_type.to_string(), location.to_string()), hourly);
    }

    pub fn fail_next_create(&self, error: CloudError) {
        *self.fail_create_with.lock() = Some(error);
    }

    pub fn calls(&self) -> Vec<CloudCall> {
        self.inner.lock().calls.clone()
    }

    pub fn server(&self, name: &str) -> Option<CloudServer> {
        self.inner.lock().servers.get(name).cloned()
    }

    fn fresh_id(inner: &mut Inner) -> u64 {
        inner.next_id += 1;
        inner.next_id
    }
}

#[async_trait]
impl CloudProvider for FakeCloudProvider {
    async fn create_server(&self, spec: CreateServerSpec) -> Result<CloudServer, CloudError> {
        if let Some(error) = self.fail_create_with.lock().take() {
            return Err(error);
        }
        let mut inner = self.inner.lock();
        let id = Self::fresh_id(&mut inner);
        let now = self.clock_secs.load(Ordering::Relaxed);
        let server = CloudServer {
            id,
            name: spec.name.clone(),
            server_type: spec.server_type,
            location: spec.location.unwrap_or_else(|| "nbg1".to_string()),
            ipv4: spec.net.ipv4.then(|| format!("10.0.0.{id}")),
            ipv6: spec.net.ipv6.then(|| format!("fd00::{id}")),
            status: CloudServerStatus::Initializing,
            created_at_secs: now,
            labels: spec.labels,
        };
        inner.servers.insert(spec.name.clone(), server.clone());
        inner.calls.push(CloudCall::Create(spec.name));
        Ok(server)
    }

    async fn get_server_by_name(&self, name: &str) -> Result<Option<CloudServer>, CloudError> {
        Ok(self.inner.lock().servers.get(name).cloned())
    }

    async fn list_servers(&self) -> Result<Vec<CloudServer>, CloudError> {
        Ok(self.inner.lock().servers.values().cloned().collect())
    }

    async fn update_server(&self, spec: UpdateServerSpec) -> Result<CloudServer, CloudError> {
        let mut inner = self.inner.lock();
        let mut server = inner
            .servers
            .remove(&spec.current_name)
            .ok_or_else(|| CloudError::NotFound(spec.current_name.clone()))?;
        server.name = spec.new_name.clone();
        server.labels = spec.labels;
        inner.servers.insert(server.name.clone(), server.clone());
        inner.calls.push(CloudCall::Update(spec.new_name));
        Ok(server)
    }

    async fn rebuild_server(&self, name: &str, _image: &str) -> Result<(), CloudError> {
        let mut inner = self.inner.lock();
        let server =
            inner.servers.get_mut(name).ok_or_else(|| CloudError::NotFound(name.to_string()))?;
        server.status = CloudServerStatus::Initializing;
        inner.calls.push(CloudCall::Rebuild(name.to_string()));
        Ok(())
    }

    async fn power_off_server(&self, name: &str) -> Result<(), CloudError> {
        let mut inner = self.inner.lock();
        let server =
            inner.servers.get_mut(name).ok_or_else(|| CloudError::NotFound(name.to_string()))?;
        server.status = CloudServerStatus::Off;
        inner.calls.push(CloudCall::PowerOff(name.to_string()));
        Ok(())
    }

    async fn delete_server(&self, name: &str) -> Result<(), CloudError> {
        let mut inner = self.inner.lock();
        inner.servers.remove(name).ok_or_else(|| CloudError::NotFound(name.to_string()))?;
        inner.calls.push(CloudCall::Delete(name.to_string()));
        Ok(())
    }

    async fn get_ssh_key_by_name(&self, name: &str) -> Result<Option<SshKey>, CloudError> {
        Ok(self.inner.lock().ssh_keys.get(name).cloned())
    }

    async fn hourly_price(
        &self,
        server_type: &str,
        location: &str,
    ) -> Result<Option<f64>, CloudError> {
        Ok(self.inner.lock().prices.get(&(server_type.to_string(), location.to_string())).copied())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
