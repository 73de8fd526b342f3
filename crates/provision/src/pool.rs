// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A bounded worker pool for bootstrap tasks (§5 worker pool / setup
//! sub-pool), replacing the original implementation's
//! `ThreadPoolExecutor`-based submission with tokio tasks gated by a
//! semaphore.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(capacity.max(1))) }
    }

    /// Submit `task` to run as soon as a slot is free. Fire-and-forget: the
    /// caller does not await completion (§4.2 — the Provisioner does not
    /// block the loop thread beyond cloud-create).
    pub fn submit<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let semaphore = self.semaphore.clone();
        tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            task.await;
        });
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
