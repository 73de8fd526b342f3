// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Scale-Up Loop (§4.4): observes queued jobs and standby-pool
//! deficits, decides server creations, enforces caps, and feeds
//! unrecoverable-without-capacity failures to the [`Mailbox`].

use crate::fleet::{self, SnapshotError};
use crate::mailbox::Mailbox;
use crate::metrics::Metrics;
use runner_cloud::CloudProvider;
use runner_core::failure::{MailboxMessage, ScaleUpFailureKind};
use runner_core::label::{covers, has_required_labels};
use runner_core::names::{NamePrefixes, ServerRole};
use runner_core::resolver::{resolve, Defaults, ResolverInputs, Scripts};
use runner_core::server::LabelSchema;
use runner_core::label::MetaLabelMap;
use runner_core::{
    id, Clock, LabelSet, RunnerStatus, Server, ServerLifecycle, ServerStatus, StandbyDeclaration,
};
use runner_provision::{Provisioner, ProvisionError, Recycler};
use runner_scm::{Job, JobStatus, SourceControl};
use std::sync::Arc;
use std::time::Duration;

pub struct ScaleUpLoop<C: Clock> {
    pub cloud: Arc<dyn CloudProvider>,
    pub scm: Arc<dyn SourceControl>,
    pub provisioner: Arc<Provisioner>,
    pub recycler: Arc<Recycler>,
    pub label_schema: LabelSchema,
    pub name_prefixes: NamePrefixes,
    pub scripts: Arc<dyn Scripts>,
    pub defaults: Defaults,
    pub meta_labels: MetaLabelMap,
    pub label_prefix: String,
    pub required_labels: LabelSet,
    pub standby: Vec<StandbyDeclaration>,
    pub max_runners_in_workflow_run: Option<u32>,
    pub max_runners: Option<u32>,
    pub ssh_key_name: String,
    pub ssh_key_fingerprint: String,
    pub mailbox: Mailbox,
    pub metrics: Metrics,
    pub clock: C,
    pub interval: Duration,
}

impl<C: Clock> ScaleUpLoop<C> {
    /// Run until `cancelled` fires, sleeping `interval` between iterations
    /// (§4.4 step 6, §5 cancellation polled at the top of every iteration).
    pub async fn run(&self, cancelled: &tokio_util::sync::CancellationToken) {
        loop {
            if cancelled.is_cancelled() {
                return;
            }
            if let Err(e) = self.run_once().await {
                tracing::error!(error = %e, "scale-up cycle failed, sleeping and retrying");
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancelled.cancelled() => return,
            }
        }
    }

    pub async fn run_once(&self) -> Result<(), SnapshotError> {
        // 1. Snapshot.
        let fleet = fleet::snapshot(self.cloud.as_ref(), self.scm.as_ref(), &self.label_schema).await?;
        let queued_runs = self.scm.list_queued_workflow_runs().await?;

        // 2. Classify recyclables.
        let recycle_prefix = self.name_prefixes.recycle_prefix();
        let mut recyclables: Vec<runner_cloud::CloudServer> =
            fleet.raw_servers.iter().filter(|s| s.name.starts_with(&recycle_prefix)).cloned().collect();

        let now = self.clock.now_secs();
        // Names created so far this cycle — counted against caps alongside
        // `fleet.servers`, since a later job in the same cycle must not
        // double up on a run/global cap the earlier job already consumed.
        let mut created_this_cycle: Vec<String> = Vec::new();

        // 3. Drive from queued work.
        for run in &queued_runs {
            if self.run_cap_reached(&fleet.servers, &created_this_cycle, run.run_id) {
                continue;
            }
            for job in &run.jobs {
                self.handle_job(
                    &fleet,
                    &mut recyclables,
                    &mut created_this_cycle,
                    run.run_id,
                    job,
                    now,
                )
                .await;
            }
        }

        // 4. Drive from standby pools.
        for (i, declaration) in self.standby.iter().enumerate() {
            self.replenish_standby(&fleet, declaration, i as u32, now).await;
        }

        Ok(())
    }

    fn run_cap_reached(
        &self,
        servers: &[Server],
        created_this_cycle: &[String],
        run_id: u64,
    ) -> bool {
        let Some(cap) = self.max_runners_in_workflow_run else { return false };
        let prefix = self.name_prefixes.run_id_prefix(run_id);
        let count = servers.iter().filter(|s| s.name.starts_with(&prefix)).count()
            + created_this_cycle.iter().filter(|n| n.starts_with(&prefix)).count();
        count as u32 >= cap
    }

    fn global_cap_reached(&self, servers: &[Server], created_this_cycle: &[String]) -> bool {
        let Some(cap) = self.max_runners else { return false };
        (servers.len() + created_this_cycle.len()) as u32 >= cap
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_job(
        &self,
        fleet: &fleet::Fleet,
        recyclables: &mut Vec<runner_cloud::CloudServer>,
        created_this_cycle: &mut Vec<String>,
        run_id: u64,
        job: &Job,
        now: u64,
    ) {
        if job.status == JobStatus::Completed {
            return;
        }

        let name = self.name_prefixes.job_server_name(run_id, job.job_id);
        if fleet.servers.iter().any(|s| s.name == name) || created_this_cycle.iter().any(|n| *n == name) {
            return;
        }

        let mut effective_labels = job.labels.clone();
        if job.status == JobStatus::InProgress {
            if let Some(runner_name) = &job.runner_name {
                match self.name_prefixes.role_of(runner_name) {
                    Some(ServerRole::Standby) => return,
                    _ => {
                        if let Some(runner) = fleet.runners.iter().find(|r| &r.name == runner_name) {
                            effective_labels = runner.labels.clone();
                        }
                    }
                }
            }
        }

        if self.run_cap_reached(&fleet.servers, created_this_cycle, run_id) {
            return;
        }

        if !has_required_labels(&effective_labels, &self.required_labels) {
            return;
        }

        let already_covered = fleet
            .runners
            .iter()
            .any(|r| r.status == RunnerStatus::OnlineIdle && covers(&r.labels, &effective_labels));
        if already_covered {
            return;
        }

        let shape = match resolve(
            ResolverInputs {
                label_prefix: &self.label_prefix,
                meta_labels: &self.meta_labels,
                defaults: &self.defaults,
                job_labels: &effective_labels,
            },
            self.scripts.as_ref(),
        ) {
            Ok(shape) => shape,
            Err(e) => {
                tracing::warn!(server = %name, error = %e, "skipping job with unresolvable shape");
                return;
            }
        };

        match self
            .recycler
            .try_recycle(recyclables.as_slice(), &name, &shape, &self.ssh_key_fingerprint)
            .await
        {
            Ok(Some(original_name)) => {
                recyclables.retain(|c| c.name != original_name);
                created_this_cycle.push(name);
                self.metrics.server_recycled();
                return;
            }
            Ok(None) => {}
            Err(e) => {
                self.handle_provision_error(e, name, effective_labels, now);
                return;
            }
        }

        if self.global_cap_reached(&fleet.servers, created_this_cycle) {
            self.mailbox.post(MailboxMessage {
                at_secs: now,
                labels: effective_labels,
                server_name: name,
                kind: ScaleUpFailureKind::MaxNumberOfServersReached,
                detail: "max_runners cap reached".to_string(),
            });
            self.metrics.mailbox_failure_posted();
            return;
        }

        match self
            .provisioner
            .provision(&name, &shape, &self.ssh_key_name, &self.ssh_key_fingerprint)
            .await
        {
            Ok(()) => {
                created_this_cycle.push(name);
                self.metrics.server_created();
            }
            Err(e) => self.handle_provision_error(e, name, effective_labels, now),
        }
    }

    fn handle_provision_error(&self, e: ProvisionError, name: String, labels: LabelSet, now: u64) {
        if e.is_mailbox_worthy() {
            let kind = match &e {
                ProvisionError::MaxNumberOfServersReached => ScaleUpFailureKind::MaxNumberOfServersReached,
                _ => ScaleUpFailureKind::ResourceLimitExceeded,
            };
            self.mailbox.post(MailboxMessage {
                at_secs: now,
                labels,
                server_name: name,
                kind,
                detail: e.to_string(),
            });
            self.metrics.mailbox_failure_posted();
        } else {
            tracing::warn!(server = %name, error = %e, "provision attempt failed, will retry next cycle");
        }
    }

    async fn replenish_standby(
        &self,
        fleet: &fleet::Fleet,
        declaration: &StandbyDeclaration,
        index: u32,
        now: u64,
    ) {
        let present = fleet
            .servers
            .iter()
            .filter(|s| covers(&s.labels, &declaration.labels))
            .filter(|s| {
                !declaration.replenish_immediately
                    || (s.lifecycle != ServerLifecycle::Off
                        && matches!(s.status, Some(ServerStatus::Initializing) | Some(ServerStatus::Ready)))
            })
            .count() as u32;

        if present >= declaration.count {
            return;
        }

        let shape = match resolve(
            ResolverInputs {
                label_prefix: &self.label_prefix,
                meta_labels: &self.meta_labels,
                defaults: &self.defaults,
                job_labels: &declaration.labels,
            },
            self.scripts.as_ref(),
        ) {
            Ok(shape) => shape,
            Err(e) => {
                tracing::warn!(error = %e, "skipping standby declaration with unresolvable shape");
                return;
            }
        };

        for deficit in 0..(declaration.count - present) {
            if self.max_runners.is_some_and(|cap| fleet.servers.len() as u32 >= cap) {
                self.mailbox.post(MailboxMessage {
                    at_secs: now,
                    labels: declaration.labels.clone(),
                    server_name: self.name_prefixes.standby_server_name(&id::uid(now, index * 1000 + deficit)),
                    kind: ScaleUpFailureKind::MaxNumberOfServersReached,
                    detail: "max_runners cap reached".to_string(),
                });
                self.metrics.mailbox_failure_posted();
                continue;
            }
            let name = self.name_prefixes.standby_server_name(&id::uid(now, index * 1000 + deficit));
            match self
                .provisioner
                .provision(&name, &shape, &self.ssh_key_name, &self.ssh_key_fingerprint)
                .await
            {
                Ok(()) => self.metrics.server_created(),
                Err(e) => self.handle_provision_error(e, name, declaration.labels.clone(), now),
            }
        }
    }
}

#[cfg(test)]
#[path = "scale_up_tests.rs"]
mod tests;
