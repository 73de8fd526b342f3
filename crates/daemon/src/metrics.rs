// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet counters, logged on an interval rather than exported over a
//! scrape endpoint — this controller has no metrics non-goal to honor, but
//! it also has no existing Prometheus wiring to extend, so plain atomics
//! plus a periodic `tracing` emission is the least new surface that still
//! gives an operator a running total.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Counters {
    servers_created: AtomicU64,
    servers_recycled: AtomicU64,
    servers_deleted: AtomicU64,
    bootstrap_failures: AtomicU64,
    mailbox_failures_posted: AtomicU64,
    mailbox_failures_resolved_by_sacrifice: AtomicU64,
}

/// Shared fleet counters. Cloning is cheap — every loop holds a handle.
#[derive(Clone, Default)]
pub struct Metrics {
    counters: Arc<Counters>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server_created(&self) {
        self.counters.servers_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn server_recycled(&self) {
        self.counters.servers_recycled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn server_deleted(&self) {
        self.counters.servers_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bootstrap_failed(&self) {
        self.counters.bootstrap_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mailbox_failure_posted(&self) {
        self.counters.mailbox_failures_posted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mailbox_failure_resolved_by_sacrifice(&self) {
        self.counters.mailbox_failures_resolved_by_sacrifice.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot_line(&self) -> String {
        format!(
            "servers_created={} servers_recycled={} servers_deleted={} bootstrap_failures={} mailbox_posted={} mailbox_resolved_by_sacrifice={}",
            self.counters.servers_created.load(Ordering::Relaxed),
            self.counters.servers_recycled.load(Ordering::Relaxed),
            self.counters.servers_deleted.load(Ordering::Relaxed),
            self.counters.bootstrap_failures.load(Ordering::Relaxed),
            self.counters.mailbox_failures_posted.load(Ordering::Relaxed),
            self.counters.mailbox_failures_resolved_by_sacrifice.load(Ordering::Relaxed),
        )
    }

    /// Log the running totals every `interval` until `cancelled` fires.
    pub async fn run(&self, interval: Duration, cancelled: &tokio_util::sync::CancellationToken) {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancelled.cancelled() => return,
            }
            tracing::info!(counters = %self.snapshot_line(), "fleet counters");
        }
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
