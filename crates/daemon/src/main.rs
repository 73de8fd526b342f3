// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `runnerd`: the fleet controller process (§5).
//!
//! Exactly three long-lived tasks share the process: the Scale-Up Loop,
//! the Scale-Down Loop, and the bootstrap worker pool (owned by the
//! Provisioner). A single exclusive file lock enforces that at most one
//! instance runs against a given fleet at a time.

use runner_cloud::{CloudProvider, HetznerProvider};
use runner_core::label::label_set;
use runner_core::resolver::Defaults;
use runner_core::server::LabelSchema;
use runner_core::standby::StandbyDeclaration;
use runner_core::{names::NamePrefixes, SystemClock};
use runner_daemon::{
    Config, FsScripts, Mailbox, Metrics, ProcessLock, ScaleDownLoop, ScaleUpLoop, SshBootstrapper,
};
use runner_provision::{Provisioner, Recycler, WorkerPool};
use runner_scm::{GithubSourceControl, SourceControl};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let config_path =
        std::env::var("RUNNERD_CONFIG").unwrap_or_else(|_| "/etc/runnerd/config.toml".to_string());
    let config = Config::load(&PathBuf::from(config_path))?;

    let state_dir = std::env::var("RUNNERD_STATE_DIR").unwrap_or_else(|_| "/var/lib/runnerd".to_string());
    let lock = ProcessLock::acquire(&PathBuf::from(&state_dir).join("runnerd.lock"))?;
    tracing::info!(path = %lock.path().display(), "acquired controller lock");

    let cloud: Arc<dyn CloudProvider> = Arc::new(HetznerProvider::new(config.hetzner_token()?.to_string())?);
    let scm: Arc<dyn SourceControl> =
        Arc::new(GithubSourceControl::new(config.github_token()?.to_string(), config.github_repository.clone())?);

    let label_schema = LabelSchema::new(config.runner_label.clone());
    let name_prefixes = NamePrefixes::new(format!("{}-", config.runner_label));
    let required_labels = label_set(config.required_labels.iter());
    let standby: Vec<StandbyDeclaration> = config
        .standby
        .iter()
        .map(|s| StandbyDeclaration::new(label_set(s.labels.iter()), s.count, s.replenish_immediately))
        .collect();

    let scripts_dir =
        std::env::var("RUNNERD_SCRIPTS_DIR").unwrap_or_else(|_| "/etc/runnerd/scripts".to_string());
    let scripts = Arc::new(FsScripts::new(scripts_dir.clone()));
    let defaults: Defaults = config.defaults.clone();

    let mailbox = Mailbox::new();
    let metrics = Metrics::new();
    let pool = WorkerPool::new(config.workers);
    let bootstrapper = Arc::new(SshBootstrapper::new(cloud.clone(), scripts_dir));
    let provisioner = Arc::new(Provisioner::new(
        cloud.clone(),
        scm.clone(),
        bootstrapper,
        pool,
        label_schema.clone(),
        config.github_repository.clone(),
        config.max_server_ready_time(),
    ));
    let recycler = Arc::new(Recycler::new(cloud.clone(), provisioner.clone(), label_schema.clone()));

    let scale_up = ScaleUpLoop {
        cloud: cloud.clone(),
        scm: scm.clone(),
        provisioner,
        recycler,
        label_schema: label_schema.clone(),
        name_prefixes: name_prefixes.clone(),
        scripts,
        defaults,
        meta_labels: config.meta_labels.clone(),
        label_prefix: config.label_prefix.clone(),
        required_labels,
        standby: standby.clone(),
        max_runners_in_workflow_run: config.max_runners_in_workflow_run,
        max_runners: config.max_runners,
        ssh_key_name: config.ssh_key_name.clone(),
        ssh_key_fingerprint: config.ssh_key_fingerprint.clone(),
        mailbox: mailbox.clone(),
        metrics: metrics.clone(),
        clock: SystemClock,
        interval: config.scale_up_interval(),
    };

    let mut scale_down = ScaleDownLoop::new(
        cloud,
        scm,
        label_schema,
        name_prefixes,
        standby,
        config.ssh_key_fingerprint.clone(),
        mailbox,
        metrics.clone(),
        SystemClock,
        config.scale_down_interval(),
        config.max_powered_off_time(),
        config.max_runner_registration_time(),
        config.max_unused_runner_time(),
        config.end_of_life_minutes,
        config.recycle,
    );

    let cancelled = Arc::new(tokio_util::sync::CancellationToken::new());

    let shutdown_signal = {
        let cancelled = cancelled.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
            cancelled.cancel();
        }
    };

    let mut scale_up_task = {
        let cancelled = cancelled.clone();
        tokio::spawn(async move { scale_up.run(&cancelled).await })
    };
    let mut scale_down_task = {
        let cancelled = cancelled.clone();
        tokio::spawn(async move { scale_down.run(&cancelled).await })
    };
    let metrics_task = {
        let cancelled = cancelled.clone();
        tokio::spawn(async move { metrics.run(Duration::from_secs(60), &cancelled).await })
    };

    tokio::select! {
        _ = shutdown_signal => {}
        _ = &mut scale_up_task => tracing::error!("scale-up task exited unexpectedly"),
        _ = &mut scale_down_task => tracing::error!("scale-down task exited unexpectedly"),
    }

    cancelled.cancel();
    let _ = tokio::join!(scale_up_task, scale_down_task, metrics_task);
    Ok(())
}
