// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Administrative commands against a running fleet: list managed servers,
//! open or print an SSH connection to one, and tear everything down. Each
//! talks to the cloud and source-control backends directly, the same way
//! the convergence loops do, rather than going through the daemon process.

use crate::error::{CliError, CliResult};
use runner_cloud::{CloudProvider, CloudServerStatus};
use runner_core::names::NamePrefixes;
use runner_scm::SourceControl;
use std::sync::Arc;
use tokio::process::Command;

fn status_label(status: CloudServerStatus) -> &'static str {
    match status {
        CloudServerStatus::Initializing => "initializing",
        CloudServerStatus::Running => "running",
        CloudServerStatus::Off => "off",
    }
}

async fn managed_servers(
    cloud: &Arc<dyn CloudProvider>,
    name_prefixes: &NamePrefixes,
) -> CliResult<Vec<runner_cloud::CloudServer>> {
    let servers = cloud.list_servers().await?;
    Ok(servers.into_iter().filter(|s| name_prefixes.is_managed(&s.name)).collect())
}

pub async fn list(cloud: &Arc<dyn CloudProvider>, name_prefixes: &NamePrefixes) -> CliResult<()> {
    let managed = managed_servers(cloud, name_prefixes).await?;

    if managed.is_empty() {
        println!("No servers found");
        return Ok(());
    }

    println!("{:10} {}", "STATUS", "NAME");
    for server in managed {
        println!("{:10} {}", status_label(server.status), server.name);
    }
    Ok(())
}

fn ssh_command_for(address: &str) -> String {
    format!("ssh -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null root@{address}")
}

async fn resolve_running_server_address(
    cloud: &Arc<dyn CloudProvider>,
    server_name: &str,
) -> CliResult<String> {
    let server = cloud
        .get_server_by_name(server_name)
        .await?
        .ok_or_else(|| CliError::ServerNotFound(server_name.to_string()))?;

    if server.status != CloudServerStatus::Running {
        return Err(CliError::ServerNotRunning {
            name: server_name.to_string(),
            status: status_label(server.status).to_string(),
        });
    }

    server
        .ipv4
        .or(server.ipv6)
        .ok_or_else(|| CliError::ServerNotFound(server_name.to_string()))
}

/// Print the `ssh` command line for `server_name` without running it.
pub async fn ssh_command(cloud: &Arc<dyn CloudProvider>, server_name: &str) -> CliResult<()> {
    let address = resolve_running_server_address(cloud, server_name).await?;
    println!("{}", ssh_command_for(&address));
    Ok(())
}

/// Open an interactive `ssh` session to `server_name`, replacing nothing —
/// this shells out and waits, it does not `exec()` over the current process.
pub async fn ssh(cloud: &Arc<dyn CloudProvider>, server_name: &str) -> CliResult<()> {
    let address = resolve_running_server_address(cloud, server_name).await?;
    let status = Command::new("ssh")
        .args(["-o", "StrictHostKeyChecking=no", "-o", "UserKnownHostsFile=/dev/null"])
        .arg(format!("root@{address}"))
        .status()
        .await?;
    if !status.success() {
        tracing::warn!(%server_name, code = ?status.code(), "ssh session exited non-zero");
    }
    Ok(())
}

/// Delete every managed server and deregister every self-hosted runner,
/// regardless of lifecycle state. There is no partial mode: this is the
/// tear-it-all-down escape hatch, not something the convergence loops call.
pub async fn delete_all(
    cloud: &Arc<dyn CloudProvider>,
    scm: &Arc<dyn SourceControl>,
    name_prefixes: &NamePrefixes,
) -> CliResult<()> {
    let runners = scm.list_self_hosted_runners().await?;
    for runner in runners {
        if !name_prefixes.is_managed(&runner.name) {
            continue;
        }
        tracing::info!(runner = %runner.name, "deleting self-hosted runner");
        scm.remove_self_hosted_runner(runner.id).await?;
    }

    let servers = cloud.list_servers().await?;
    for server in servers {
        if !name_prefixes.is_managed(&server.name) {
            continue;
        }
        tracing::info!(server = %server.name, "deleting server");
        cloud.delete_server(&server.name).await?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
