// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::CloudError;
use crate::model::{CloudServer, CreateServerSpec, SshKey, UpdateServerSpec};
use async_trait::async_trait;

/// Everything the Provisioner and Recycler need from the cloud backend.
///
/// Grounded on the same seam the agent runtime uses to abstract over
/// Docker/Kubernetes/local process spawning: one trait, a production
/// implementation per backend, and a fake for tests.
#[async_trait]
pub trait CloudProvider: Send + Sync + 'static {
    async fn create_server(&self, spec: CreateServerSpec) -> Result<CloudServer, CloudError>;

    async fn get_server_by_name(&self, name: &str) -> Result<Option<CloudServer>, CloudError>;

    async fn list_servers(&self) -> Result<Vec<CloudServer>, CloudError>;

    /// Rename a recyclable server and stamp it with a fresh label set, ahead
    /// of a rebuild.
    async fn update_server(&self, spec: UpdateServerSpec) -> Result<CloudServer, CloudError>;

    /// Reinstall `image` on an existing server, waiting for the rebuild
    /// action to finish. Used only by the Recycler.
    async fn rebuild_server(&self, name: &str, image: &str) -> Result<(), CloudError>;

    async fn power_off_server(&self, name: &str) -> Result<(), CloudError>;

    async fn delete_server(&self, name: &str) -> Result<(), CloudError>;

    async fn get_ssh_key_by_name(&self, name: &str) -> Result<Option<SshKey>, CloudError>;

    /// Hourly price for a server type in the given location, when the
    /// provider's pricing catalog has an entry. `None` means "no price data"
    /// and the Scale-Down Loop's cheapest-first recycle selection falls back
    /// to random choice among candidates, matching the upstream behavior of
    /// treating missing price data as infinite cost.
    async fn hourly_price(
        &self,
        server_type: &str,
        location: &str,
    ) -> Result<Option<f64>, CloudError>;
}
