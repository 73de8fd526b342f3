// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared snapshot step (§4.4 step 1, §4.5 step 1): both loops list the
//! active cloud fleet and the repository's registered runners, then
//! reconstruct the richer [`runner_core::Server`]/[`runner_core::Runner`]
//! view from the raw wire types. Keeping this in one place means the two
//! loops can never disagree about what "active" or "runner-bearing" means.

use runner_cloud::{CloudError, CloudProvider, CloudServer, CloudServerStatus};
use runner_core::server::{LabelSchema, ServerStatus};
use runner_core::{Runner, RunnerStatus, Server, ServerLifecycle};
use runner_scm::{ScmError, SourceControl};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cloud provider error: {0}")]
    Cloud(#[from] CloudError),
    #[error("source-control error: {0}")]
    Scm(#[from] ScmError),
}

pub struct Fleet {
    /// Active-scoped servers only, status-annotated from `runners`.
    pub servers: Vec<Server>,
    /// The same active-scoped servers in raw cloud-wire form, kept alongside
    /// `servers` because the Recycler matches against raw labels/location
    /// rather than the decoded capability view.
    pub raw_servers: Vec<CloudServer>,
    pub runners: Vec<Runner>,
}

fn to_core_server(raw: &CloudServer, schema: &LabelSchema) -> Server {
    let lifecycle = match raw.status {
        CloudServerStatus::Initializing => ServerLifecycle::Starting,
        CloudServerStatus::Running => ServerLifecycle::Running,
        CloudServerStatus::Off => ServerLifecycle::Off,
    };
    Server {
        name: raw.name.clone(),
        lifecycle,
        server_type: raw.server_type.clone(),
        location: raw.location.clone(),
        ipv4: raw.ipv4.is_some(),
        ipv6: raw.ipv6.is_some(),
        created_at_secs: raw.created_at_secs,
        labels: schema.decode(&raw.labels),
        ssh_key_fingerprint: schema.ssh_key_fingerprint(&raw.labels).map(str::to_string),
        recycle_marked_at: schema.recycle_marked_at(&raw.labels),
        status: None,
    }
}

/// Find the runner bearing `server_name`, if one has registered, and map its
/// state to the ready/busy annotation (§4.4 step 1, §3 Runner). No matching
/// runner means the server hasn't registered one yet, i.e. `Initializing`.
fn annotate_status(server_name: &str, runners: &[Runner]) -> ServerStatus {
    let Some(runner) = runners.iter().find(|r| r.belongs_to_server(server_name)) else {
        return ServerStatus::Initializing;
    };
    match runner.status {
        RunnerStatus::OnlineBusy => ServerStatus::Busy,
        RunnerStatus::OnlineIdle | RunnerStatus::Offline => ServerStatus::Ready,
    }
}

pub async fn snapshot(
    cloud: &dyn CloudProvider,
    scm: &dyn SourceControl,
    label_schema: &LabelSchema,
) -> Result<Fleet, SnapshotError> {
    let all_servers = cloud.list_servers().await?;
    let runners: Vec<Runner> = scm.list_self_hosted_runners().await?.iter().map(|r| r.to_core()).collect();

    let raw_servers: Vec<CloudServer> = all_servers
        .into_iter()
        .filter(|raw| raw.labels.contains_key(&label_schema.active_key))
        .collect();

    let servers = raw_servers
        .iter()
        .map(|raw| {
            let mut server = to_core_server(raw, label_schema);
            server.status = Some(annotate_status(&server.name, &runners));
            server
        })
        .collect();

    Ok(Fleet { servers, raw_servers, runners })
}

#[cfg(test)]
#[path = "fleet_tests.rs"]
mod tests;
