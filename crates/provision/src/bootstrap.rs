// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bootstrap protocol (§6.3): turn a freshly created/recycled server
//! into a functioning runner. Opaque to the core beyond its contract — on
//! success the runner appears in the source-control service under a name
//! matching the server.

use async_trait::async_trait;
use runner_core::label::LabelSet;
use std::time::Duration;

use crate::error::BootstrapError;

#[derive(Debug, Clone)]
pub struct BootstrapContext {
    pub server_id: u64,
    pub server_name: String,
    pub server_type_name: String,
    pub server_location_name: String,
    pub architecture: String,
    pub setup_script: String,
    pub startup_script: String,
    pub labels: LabelSet,
    pub registration_token: String,
    pub github_repository: String,
    pub max_server_ready_time: Duration,
}

/// Abstracts SSH readiness waiting plus setup/startup script execution so
/// the Provisioner core stays free of subprocess/SSH plumbing.
#[async_trait]
pub trait Bootstrapper: Send + Sync + 'static {
    async fn wait_until_ssh_ready(
        &self,
        server_name: &str,
        timeout: Duration,
    ) -> Result<(), BootstrapError>;

    async fn run_setup_script(&self, ctx: &BootstrapContext) -> Result<(), BootstrapError>;

    async fn run_startup_script(&self, ctx: &BootstrapContext) -> Result<(), BootstrapError>;
}

/// Run the full bootstrap protocol against `bootstrapper`. All steps are
/// idempotent-on-retry within one provision attempt (§4.2 step 3); a
/// failure here does not delete the server — the Scale-Down Loop observes
/// it as zombie or unused and acts.
pub async fn run_bootstrap(
    bootstrapper: &dyn Bootstrapper,
    ctx: BootstrapContext,
) -> Result<(), BootstrapError> {
    bootstrapper.wait_until_ssh_ready(&ctx.server_name, ctx.max_server_ready_time).await?;
    bootstrapper.run_setup_script(&ctx).await?;
    bootstrapper.run_startup_script(&ctx).await?;
    Ok(())
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    pub enum BootstrapCall {
        WaitForSsh(String),
        Setup(String),
        Startup(String),
    }

    #[derive(Default)]
    struct Inner {
        calls: Vec<BootstrapCall>,
        fail_ssh_for: Option<String>,
    }

    #[derive(Clone, Default)]
    pub struct FakeBootstrapper {
        inner: Arc<Mutex<Inner>>,
    }

    impl FakeBootstrapper {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_ssh_for(&self, server_name: &str) {
            self.inner.lock().fail_ssh_for = Some(server_name.to_string());
        }

        pub fn calls(&self) -> Vec<BootstrapCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl Bootstrapper for FakeBootstrapper {
        async fn wait_until_ssh_ready(
            &self,
            server_name: &str,
            _timeout: Duration,
        ) -> Result<(), BootstrapError> {
            let mut inner = self.inner.lock();
            inner.calls.push(BootstrapCall::WaitForSsh(server_name.to_string()));
            if inner.fail_ssh_for.as_deref() == Some(server_name) {
                return Err(BootstrapError::SshTimeout);
            }
            Ok(())
        }

        async fn run_setup_script(&self, ctx: &BootstrapContext) -> Result<(), BootstrapError> {
            self.inner.lock().calls.push(BootstrapCall::Setup(ctx.server_name.clone()));
            Ok(())
        }

        async fn run_startup_script(&self, ctx: &BootstrapContext) -> Result<(), BootstrapError> {
            self.inner.lock().calls.push(BootstrapCall::Startup(ctx.server_name.clone()));
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
