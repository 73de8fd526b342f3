// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Scale-Down Loop (§4.5): ages powered-off servers, zombies, and
//! unused runners across cycles, recycles or deletes them according to a
//! time-and-policy matrix, and drains the Scale-Up Loop's [`Mailbox`],
//! sometimes sacrificing a recyclable to free capacity for it.

use crate::fleet::{self, Fleet, SnapshotError};
use crate::mailbox::Mailbox;
use crate::metrics::Metrics;
use rand::seq::SliceRandom;
use runner_cloud::{CloudProvider, UpdateServerSpec};
use runner_core::failure::ScaleUpFailureRecord;
use runner_core::id;
use runner_core::label::covers;
use runner_core::names::NamePrefixes;
use runner_core::server::LabelSchema;
use runner_core::{AgeTable, Clock, Server, ServerLifecycle, ServerStatus, StandbyDeclaration};
use runner_scm::SourceControl;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// The unused-runner age table's payload: enough to act without a second
/// fleet lookup once the threshold fires.
#[derive(Debug, Clone)]
struct UnusedRunnerSubject {
    runner_id: u64,
    server: Option<Server>,
}

pub struct ScaleDownLoop<C: Clock> {
    pub cloud: Arc<dyn CloudProvider>,
    pub scm: Arc<dyn SourceControl>,
    pub label_schema: LabelSchema,
    pub name_prefixes: NamePrefixes,
    pub standby: Vec<StandbyDeclaration>,
    pub ssh_key_fingerprint: String,
    pub mailbox: Mailbox,
    pub metrics: Metrics,
    pub clock: C,
    pub interval: Duration,
    pub max_powered_off_time: Duration,
    pub max_runner_registration_time: Duration,
    pub max_unused_runner_time: Duration,
    pub end_of_life_minutes: u64,
    pub recycle: bool,

    powered_off: AgeTable<String, Server>,
    zombie: AgeTable<String, Server>,
    unused_runner: AgeTable<String, UnusedRunnerSubject>,
    failures: BTreeMap<String, ScaleUpFailureRecord>,
}

impl<C: Clock> ScaleDownLoop<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cloud: Arc<dyn CloudProvider>,
        scm: Arc<dyn SourceControl>,
        label_schema: LabelSchema,
        name_prefixes: NamePrefixes,
        standby: Vec<StandbyDeclaration>,
        ssh_key_fingerprint: String,
        mailbox: Mailbox,
        metrics: Metrics,
        clock: C,
        interval: Duration,
        max_powered_off_time: Duration,
        max_runner_registration_time: Duration,
        max_unused_runner_time: Duration,
        end_of_life_minutes: u64,
        recycle: bool,
    ) -> Self {
        Self {
            cloud,
            scm,
            label_schema,
            name_prefixes,
            standby,
            ssh_key_fingerprint,
            mailbox,
            metrics,
            clock,
            interval,
            max_powered_off_time,
            max_runner_registration_time,
            max_unused_runner_time,
            end_of_life_minutes,
            recycle,
            powered_off: AgeTable::new(),
            zombie: AgeTable::new(),
            unused_runner: AgeTable::new(),
            failures: BTreeMap::new(),
        }
    }

    /// Run until `cancelled` fires, sleeping `interval` between iterations
    /// (§4.5 step 8, §5 cancellation polled at the top of every iteration).
    pub async fn run(&mut self, cancelled: &tokio_util::sync::CancellationToken) {
        loop {
            if cancelled.is_cancelled() {
                return;
            }
            if let Err(e) = self.run_once().await {
                tracing::error!(error = %e, "scale-down cycle failed, sleeping and retrying");
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = cancelled.cancelled() => return,
            }
        }
    }

    pub async fn run_once(&mut self) -> Result<(), SnapshotError> {
        // 1. Snapshot.
        let fleet = fleet::snapshot(self.cloud.as_ref(), self.scm.as_ref(), &self.label_schema).await?;
        let now = self.clock.now_secs();
        let mut uid_counter: u32 = 0;

        // 2. Classify.
        self.powered_off.begin_cycle();
        self.zombie.begin_cycle();
        self.unused_runner.begin_cycle();

        let recycle_prefix = self.name_prefixes.recycle_prefix();
        let mut recyclables: Vec<Server> = fleet
            .servers
            .iter()
            .filter(|s| s.lifecycle == ServerLifecycle::Off && s.name.starts_with(&recycle_prefix))
            .cloned()
            .collect();

        for server in &fleet.servers {
            if server.lifecycle == ServerLifecycle::Off && !server.name.starts_with(&recycle_prefix) {
                self.powered_off.observe(server.name.clone(), now, server.clone());
            }
            if server.lifecycle == ServerLifecycle::Running && server.status == Some(ServerStatus::Initializing) {
                self.zombie.observe(server.name.clone(), now, server.clone());
            }
        }
        self.powered_off.evict_unobserved();
        self.zombie.evict_unobserved();

        // 3. Standby accounting for unused detection.
        let mut standby_remaining: Vec<u32> = self.standby.iter().map(|d| d.count).collect();
        'runners: for runner in &fleet.runners {
            if !runner.status.is_unused_candidate() {
                continue;
            }
            for (i, declaration) in self.standby.iter().enumerate() {
                if standby_remaining[i] > 0 && covers(&runner.labels, &declaration.labels) {
                    standby_remaining[i] -= 1;
                    continue 'runners;
                }
            }
            let server = fleet.servers.iter().find(|s| runner.belongs_to_server(&s.name)).cloned();
            self.unused_runner.observe(
                runner.name.clone(),
                now,
                UnusedRunnerSubject { runner_id: runner.id, server },
            );
        }
        self.unused_runner.evict_unobserved();

        // 4. Age tables: act on anything past its threshold.
        let powered_off_ready: Vec<Server> = self
            .powered_off
            .iter()
            .filter(|(_, e)| e.age_secs(now) >= self.max_powered_off_time.as_secs())
            .map(|(_, e)| e.payload.clone())
            .collect();
        for server in &powered_off_ready {
            self.recycle_or_delete(server, now, &mut recyclables, &mut uid_counter).await;
        }

        let zombie_ready: Vec<Server> = self
            .zombie
            .iter()
            .filter(|(_, e)| e.age_secs(now) >= self.max_runner_registration_time.as_secs())
            .map(|(_, e)| e.payload.clone())
            .collect();
        for server in &zombie_ready {
            self.recycle_or_delete(server, now, &mut recyclables, &mut uid_counter).await;
        }

        let unused_ready: Vec<UnusedRunnerSubject> = self
            .unused_runner
            .iter()
            .filter(|(_, e)| e.age_secs(now) >= self.max_unused_runner_time.as_secs())
            .map(|(_, e)| e.payload.clone())
            .collect();
        for subject in &unused_ready {
            match (&subject.server, self.recycle) {
                (Some(server), true) => {
                    self.recycle_policy(server, now, &mut recyclables, &mut uid_counter).await;
                }
                (Some(server), false) => {
                    self.delete_ignoring_errors(&server.name).await;
                    self.deregister_ignoring_errors(subject.runner_id).await;
                }
                (None, true) => {
                    // No server to act on and recycling is the active policy:
                    // the matrix has no action for this cell.
                }
                (None, false) => {
                    self.deregister_ignoring_errors(subject.runner_id).await;
                }
            }
        }

        // 6. Drain recyclables.
        self.drain_recyclables(now, &mut recyclables).await;

        // 7. Mailbox processing.
        self.process_mailbox(now, &fleet, &mut recyclables).await;

        Ok(())
    }

    async fn recycle_or_delete(
        &self,
        server: &Server,
        now: u64,
        recyclables: &mut Vec<Server>,
        uid_counter: &mut u32,
    ) {
        if self.recycle {
            self.recycle_policy(server, now, recyclables, uid_counter).await;
        } else {
            self.delete_ignoring_errors(&server.name).await;
        }
    }

    /// §4.3/§4.5 step 5: delete outright if the SSH-key binding is missing
    /// or stale, or the server is about to cross into a new billing hour;
    /// otherwise power off and rename into the recyclable pool.
    async fn recycle_policy(
        &self,
        server: &Server,
        now: u64,
        recyclables: &mut Vec<Server>,
        uid_counter: &mut u32,
    ) {
        let key_matches = server.ssh_key_fingerprint.as_deref() == Some(self.ssh_key_fingerprint.as_str());
        let end_of_life = server.minutes_into_current_hour(now) >= self.end_of_life_minutes;
        if !key_matches || end_of_life {
            self.delete_ignoring_errors(&server.name).await;
            return;
        }

        if let Err(e) = self.cloud.power_off_server(&server.name).await {
            tracing::warn!(server = %server.name, error = %e, "power-off failed, will retry next cycle");
            return;
        }

        let uid = id::uid(now, *uid_counter);
        *uid_counter += 1;
        let new_name = self.name_prefixes.recycle_server_name(&uid);
        let mut labels = self.label_schema.encode(&server.labels, &self.ssh_key_fingerprint);
        self.label_schema.stamp_recycle_timestamp(&mut labels, now);

        match self
            .cloud
            .update_server(UpdateServerSpec {
                current_name: server.name.clone(),
                new_name: new_name.clone(),
                labels,
            })
            .await
        {
            Ok(_) => {
                let mut recycled = server.clone();
                recycled.name = new_name;
                recycled.lifecycle = ServerLifecycle::Off;
                recyclables.push(recycled);
                self.metrics.server_recycled();
            }
            Err(e) => tracing::warn!(server = %server.name, error = %e, "rename-to-recyclable failed"),
        }
    }

    /// §4.5 step 6: re-run the delete half of the recycle policy over
    /// whatever is still in the recyclable pool, pruning anything about to
    /// cross a billing hour or whose key no longer matches. A recyclable
    /// that still passes both checks needs no further action — it has
    /// already been powered off and renamed.
    async fn drain_recyclables(&self, now: u64, recyclables: &mut Vec<Server>) {
        let mut still_good = Vec::with_capacity(recyclables.len());
        for server in recyclables.drain(..) {
            let key_matches = server.ssh_key_fingerprint.as_deref() == Some(self.ssh_key_fingerprint.as_str());
            let end_of_life = server.minutes_into_current_hour(now) >= self.end_of_life_minutes;
            if !key_matches || end_of_life {
                self.delete_ignoring_errors(&server.name).await;
            } else {
                still_good.push(server);
            }
        }
        *recyclables = still_good;
    }

    async fn process_mailbox(&mut self, now: u64, fleet: &Fleet, recyclables: &mut Vec<Server>) {
        for (server_name, incoming) in self.mailbox.drain_aggregated() {
            match self.failures.get_mut(&server_name) {
                Some(existing) => {
                    existing.count += incoming.count;
                    existing.last_seen_secs = existing.last_seen_secs.max(incoming.last_seen_secs);
                    existing.detail = incoming.detail;
                    existing.labels = incoming.labels;
                }
                None => {
                    self.failures.insert(server_name, incoming);
                }
            }
        }

        let two_intervals = 2 * self.interval.as_secs();
        let mut forget = Vec::new();
        let mut act_on = Vec::new();

        for (server_name, record) in &self.failures {
            if fleet.servers.iter().any(|s| covers(&s.labels, &record.labels)) {
                forget.push(server_name.clone());
                continue;
            }
            let age = now.saturating_sub(record.first_seen_secs);
            if record.count < 2 && age > two_intervals {
                forget.push(server_name.clone());
                continue;
            }
            if recyclables.is_empty() {
                forget.push(server_name.clone());
                continue;
            }
            if record.count > 2 && age > two_intervals {
                act_on.push(server_name.clone());
            }
            // count == 2 within the window, or not yet aged past the
            // threshold: left untracked for resolution and carried into the
            // next cycle, matching the gap between "forget if < 2" and "act
            // if > 2".
        }

        for server_name in &act_on {
            if let Some(victim) = self.pick_recyclable(recyclables).await {
                recyclables.retain(|s| s.name != victim);
                self.delete_ignoring_errors(&victim).await;
                self.metrics.mailbox_failure_resolved_by_sacrifice();
            }
            forget.push(server_name.clone());
        }

        for server_name in forget {
            self.failures.remove(&server_name);
        }
    }

    /// Recyclable selection (§4.5 step 7): pick the candidate whose further
    /// retention is worth the least — fewest remaining billing-hour minutes
    /// relative to its price — falling back to a uniform-random choice when
    /// no candidate in the pool has price data at all. A candidate with a
    /// specific (type, location) combination missing from an otherwise
    /// populated price catalog is treated as maximally expensive to keep,
    /// so it is passed over rather than preferentially deleted.
    async fn pick_recyclable(&self, recyclables: &[Server]) -> Option<String> {
        if recyclables.is_empty() {
            return None;
        }

        let now = self.clock.now_secs();
        let mut scored = Vec::with_capacity(recyclables.len());
        let mut any_price_known = false;
        for server in recyclables {
            let price = self
                .cloud
                .hourly_price(&server.server_type, &server.location)
                .await
                .ok()
                .flatten();
            any_price_known |= price.is_some();
            let minutes_remaining = 60u64.saturating_sub(server.minutes_into_current_hour(now)) as f64;
            let score = match price {
                Some(hourly) => minutes_remaining - hourly / 60.0,
                None => f64::INFINITY,
            };
            scored.push((server.name.clone(), score));
        }

        if !any_price_known {
            let mut rng = rand::thread_rng();
            return scored.choose(&mut rng).map(|(name, _)| name.clone());
        }

        scored
            .into_iter()
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(name, _)| name)
    }

    async fn delete_ignoring_errors(&self, name: &str) {
        match self.cloud.delete_server(name).await {
            Ok(()) => self.metrics.server_deleted(),
            Err(e) => tracing::warn!(server = %name, error = %e, "delete failed, will retry next cycle"),
        }
    }

    async fn deregister_ignoring_errors(&self, runner_id: u64) {
        if let Err(e) = self.scm.remove_self_hosted_runner(runner_id).await {
            tracing::warn!(runner_id, error = %e, "runner deregistration failed, will retry next cycle");
        }
    }
}

#[cfg(test)]
#[path = "scale_down_tests.rs"]
mod tests;
