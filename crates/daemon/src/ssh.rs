// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production [`Bootstrapper`]: SSH/SCP shelled out to the system binaries,
//! matching the original implementation's `ssh()`/`scp()`/`wait_ssh()`
//! helpers rather than pulling in an SSH client library.

use async_trait::async_trait;
use runner_cloud::CloudProvider;
use runner_provision::{BootstrapContext, BootstrapError, Bootstrapper};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;

pub struct SshBootstrapper {
    cloud: Arc<dyn CloudProvider>,
    scripts_dir: PathBuf,
    poll_interval: Duration,
}

impl SshBootstrapper {
    pub fn new(cloud: Arc<dyn CloudProvider>, scripts_dir: impl Into<PathBuf>) -> Self {
        Self { cloud, scripts_dir: scripts_dir.into(), poll_interval: Duration::from_secs(5) }
    }

    async fn server_address(&self, server_name: &str) -> Result<String, BootstrapError> {
        let server = self
            .cloud
            .get_server_by_name(server_name)
            .await
            .map_err(|_| BootstrapError::SshTimeout)?
            .ok_or(BootstrapError::SshTimeout)?;
        server.ipv4.or(server.ipv6).ok_or(BootstrapError::SshTimeout)
    }

    fn ssh_command(&self, address: &str) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args([
            "-q",
            "-o",
            "StrictHostKeyChecking=no",
            "-o",
            "UserKnownHostsFile=/dev/null",
            &format!("root@{address}"),
        ]);
        cmd
    }

    async fn run_script(
        &self,
        address: &str,
        script_file: &str,
        extra_args: &[String],
    ) -> Result<(), BootstrapError> {
        let local_path = self.scripts_dir.join(script_file);
        let remote_path = format!("/root/{script_file}");

        let status = Command::new("scp")
            .args(["-q", "-o", "StrictHostKeyChecking=no", "-o", "UserKnownHostsFile=/dev/null"])
            .arg(&local_path)
            .arg(format!("root@{address}:{remote_path}"))
            .status()
            .await
            .map_err(|e| BootstrapError::SetupScript(e.to_string()))?;
        if !status.success() {
            return Err(BootstrapError::SetupScript(format!("scp of {script_file} failed")));
        }

        let mut remote_cmd = format!("chmod +x {remote_path} && {remote_path}");
        for arg in extra_args {
            remote_cmd.push(' ');
            remote_cmd.push_str(arg);
        }
        let status = self
            .ssh_command(address)
            .arg(remote_cmd)
            .status()
            .await
            .map_err(|e| BootstrapError::SetupScript(e.to_string()))?;
        if !status.success() {
            return Err(BootstrapError::SetupScript(format!("{script_file} exited non-zero")));
        }
        Ok(())
    }
}

#[async_trait]
impl Bootstrapper for SshBootstrapper {
    async fn wait_until_ssh_ready(
        &self,
        server_name: &str,
        timeout: Duration,
    ) -> Result<(), BootstrapError> {
        let address = self.server_address(server_name).await?;
        let deadline = Instant::now() + timeout;
        loop {
            let status = self
                .ssh_command(&address)
                .arg("hostname")
                .status()
                .await
                .map_err(|e| BootstrapError::SetupScript(e.to_string()))?;
            if status.success() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BootstrapError::SshTimeout);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn run_setup_script(&self, ctx: &BootstrapContext) -> Result<(), BootstrapError> {
        let address = self.server_address(&ctx.server_name).await?;
        self.run_script(&address, &ctx.setup_script, &[]).await
    }

    async fn run_startup_script(&self, ctx: &BootstrapContext) -> Result<(), BootstrapError> {
        let address = self.server_address(&ctx.server_name).await?;
        self.run_script(
            &address,
            &ctx.startup_script,
            &[ctx.registration_token.clone(), ctx.github_repository.clone()],
        )
        .await
        .map_err(|e| match e {
            BootstrapError::SetupScript(detail) => BootstrapError::StartupScript(detail),
            other => other,
        })
    }
}
