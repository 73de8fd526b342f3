// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// A clock that provides the current time as epoch seconds.
///
/// Both convergence loops read time only through this trait so that age
/// tables (powered-off/zombie/unused, §3) can be driven deterministically
/// in tests.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now_secs(&self) -> u64;
}

/// Real system clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
    }
}

/// Fake clock for testing with controllable time.
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<u64>>,
}

impl FakeClock {
    pub fn new(start_secs: u64) -> Self {
        Self { current: Arc::new(Mutex::new(start_secs)) }
    }

    /// Advance the clock by the given number of seconds.
    pub fn advance(&self, secs: u64) {
        *self.current.lock() += secs;
    }

    pub fn set(&self, secs: u64) {
        *self.current.lock() = secs;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(1_700_000_000)
    }
}

impl Clock for FakeClock {
    fn now_secs(&self) -> u64 {
        *self.current.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
