// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! §4.3 Recycler: reuse a powered-off, within-the-billing-hour server
//! instead of creating a fresh one.

use crate::error::ProvisionError;
use crate::provisioner::Provisioner;
use runner_cloud::{CloudError, CloudServer, UpdateServerSpec};
use runner_core::server::LabelSchema;
use runner_core::shape::DesiredShape;
use std::sync::Arc;

pub struct Recycler {
    cloud: Arc<dyn runner_cloud::CloudProvider>,
    provisioner: Arc<Provisioner>,
    label_schema: LabelSchema,
}

impl Recycler {
    pub fn new(
        cloud: Arc<dyn runner_cloud::CloudProvider>,
        provisioner: Arc<Provisioner>,
        label_schema: LabelSchema,
    ) -> Self {
        Self { cloud, provisioner, label_schema }
    }

    /// A candidate matches `shape` exactly on type, location (only if
    /// specified), IPv4/IPv6 presence, and SSH-key fingerprint (§4.3).
    fn matches(
        &self,
        candidate: &CloudServer,
        shape: &DesiredShape,
        ssh_key_fingerprint: &str,
    ) -> bool {
        if candidate.server_type != shape.server_type {
            return false;
        }
        if let Some(ref location) = shape.location {
            if &candidate.location != location {
                return false;
            }
        }
        if candidate.ipv4.is_some() != shape.net_config.ipv4 {
            return false;
        }
        if candidate.ipv6.is_some() != shape.net_config.ipv6 {
            return false;
        }
        candidate.labels.get(&self.label_schema.ssh_key_key).map(String::as_str)
            == Some(ssh_key_fingerprint)
    }

    /// Scan `candidates` for the first exact match, rename/relabel/rebuild
    /// it, and hand it off to the Provisioner's bootstrap step. Returns the
    /// matched server's original name so the caller can drop it from its
    /// candidate pool; on no match the pool is left untouched.
    pub async fn try_recycle(
        &self,
        candidates: &[CloudServer],
        new_name: &str,
        shape: &DesiredShape,
        ssh_key_fingerprint: &str,
    ) -> Result<Option<String>, ProvisionError> {
        let Some(candidate) =
            candidates.iter().find(|c| self.matches(c, shape, ssh_key_fingerprint))
        else {
            return Ok(None);
        };

        let original_name = candidate.name.clone();
        let labels = self.label_schema.encode(&shape.label_set, ssh_key_fingerprint);

        let renamed = self
            .cloud
            .update_server(UpdateServerSpec {
                current_name: original_name.clone(),
                new_name: new_name.to_string(),
                labels,
            })
            .await
            .map_err(ProvisionError::from)?;

        match self.cloud.rebuild_server(new_name, &shape.image.name).await {
            Ok(()) => {}
            Err(CloudError::ResourceLimitExceeded(detail)) => {
                return Err(ProvisionError::ResourceLimitExceeded(detail))
            }
            Err(other) => return Err(other.into()),
        }

        self.provisioner.submit_bootstrap(renamed, shape);
        Ok(Some(original_name))
    }
}

#[cfg(test)]
#[path = "recycler_tests.rs"]
mod tests;
