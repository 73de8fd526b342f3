// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! §4.2 Provisioner: create a server for a desired shape, then hand off to
//! the bootstrap worker pool.

use crate::bootstrap::{run_bootstrap, BootstrapContext, Bootstrapper};
use crate::error::ProvisionError;
use crate::pool::WorkerPool;
use runner_cloud::{CloudError, CloudProvider, CloudServer, CreateServerSpec, NetSpec};
use runner_core::server::LabelSchema;
use runner_core::shape::DesiredShape;
use runner_scm::SourceControl;
use std::sync::Arc;
use std::time::Duration;

pub struct Provisioner {
    cloud: Arc<dyn CloudProvider>,
    scm: Arc<dyn SourceControl>,
    bootstrapper: Arc<dyn Bootstrapper>,
    pool: WorkerPool,
    label_schema: LabelSchema,
    github_repository: String,
    max_server_ready_time: Duration,
}

impl Provisioner {
    pub fn new(
        cloud: Arc<dyn CloudProvider>,
        scm: Arc<dyn SourceControl>,
        bootstrapper: Arc<dyn Bootstrapper>,
        pool: WorkerPool,
        label_schema: LabelSchema,
        github_repository: String,
        max_server_ready_time: Duration,
    ) -> Self {
        Self { cloud, scm, bootstrapper, pool, label_schema, github_repository, max_server_ready_time }
    }

    /// Create `name` per `shape` and submit its bootstrap to the worker
    /// pool. Returns once the cloud create call resolves; bootstrap
    /// continues in the background (§4.2).
    pub async fn provision(
        &self,
        name: &str,
        shape: &DesiredShape,
        ssh_key_name: &str,
        ssh_key_fingerprint: &str,
    ) -> Result<(), ProvisionError> {
        let labels = self.label_schema.encode(&shape.label_set, ssh_key_fingerprint);

        let spec = CreateServerSpec {
            name: name.to_string(),
            server_type: shape.server_type.clone(),
            location: shape.location.clone(),
            image: shape.image.name.clone(),
            ssh_key_names: vec![ssh_key_name.to_string()],
            labels,
            net: NetSpec { ipv4: shape.net_config.ipv4, ipv6: shape.net_config.ipv6 },
            user_data: None,
        };

        let server = match self.cloud.create_server(spec).await {
            Ok(server) => server,
            Err(CloudError::ResourceLimitExceeded(detail)) => {
                return Err(ProvisionError::ResourceLimitExceeded(detail))
            }
            Err(CloudError::InvalidLabels(detail)) => {
                return Err(ProvisionError::InvalidLabels(detail))
            }
            Err(other) => return Err(other.into()),
        };

        self.submit_bootstrap(server, shape);
        Ok(())
    }

    /// Hand a created-or-recycled server off to the bootstrap worker pool.
    /// Shared by [`Self::provision`] and the Recycler, since both end with
    /// the same bootstrap protocol (§4.2 step 3, §4.3 "hand off to the
    /// Provisioner's bootstrap step").
    pub fn submit_bootstrap(&self, server: CloudServer, shape: &DesiredShape) {
        let scm = self.scm.clone();
        let bootstrapper = self.bootstrapper.clone();
        let github_repository = self.github_repository.clone();
        let max_server_ready_time = self.max_server_ready_time;
        let architecture = shape.image.architecture.clone();
        let setup_script = shape.setup_script.clone();
        let startup_script = shape.startup_script.clone();
        let labels = shape.label_set.clone();
        let server_name = server.name.clone();

        self.pool.submit(async move {
            let token = match scm.create_registration_token().await {
                Ok(token) => token,
                Err(e) => {
                    tracing::warn!(server = %server_name, error = %e, "bootstrap: registration token failed");
                    return;
                }
            };
            let ctx = BootstrapContext {
                server_id: server.id,
                server_name: server_name.clone(),
                server_type_name: server.server_type.clone(),
                server_location_name: server.location.clone(),
                architecture,
                setup_script,
                startup_script,
                labels,
                registration_token: token,
                github_repository,
                max_server_ready_time,
            };
            if let Err(e) = run_bootstrap(bootstrapper.as_ref(), ctx).await {
                tracing::warn!(server = %server_name, error = %e, "bootstrap failed, leaving to scale-down");
            }
        });
    }
}

#[cfg(test)]
#[path = "provisioner_tests.rs"]
mod tests;
