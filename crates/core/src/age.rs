// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A generic age-tracking table backing the Powered-Off, Zombie, and
//! Unused-Runner entries of the Scale-Down Loop (§3, §4.5).
//!
//! Each cycle, the loop re-observes every subject it still considers a
//! candidate. Anything not re-observed this cycle is assumed to have
//! resolved itself (the server was recycled, the runner came back online,
//! ...) and is evicted rather than carried forward stale.

use std::collections::BTreeMap;

/// One tracked subject: when it was first flagged, and its last-known
/// payload.
#[derive(Debug, Clone)]
pub struct AgeEntry<V> {
    pub first_seen_secs: u64,
    pub last_observed_secs: u64,
    pub payload: V,
    observed_this_cycle: bool,
}

impl<V> AgeEntry<V> {
    /// How long this subject has been continuously flagged, as of `now_secs`.
    pub fn age_secs(&self, now_secs: u64) -> u64 {
        now_secs.saturating_sub(self.first_seen_secs)
    }
}

/// A map from key to [`AgeEntry`], with cycle-based eviction.
#[derive(Debug, Clone, Default)]
pub struct AgeTable<K, V> {
    entries: BTreeMap<K, AgeEntry<V>>,
}

impl<K: Ord + Clone, V> AgeTable<K, V> {
    pub fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    /// Record that `key` is still a candidate this cycle. Starts the clock
    /// on first observation; updates the payload and observation marker on
    /// every call after.
    pub fn observe(&mut self, key: K, now_secs: u64, payload: V) -> &AgeEntry<V> {
        let entry = self.entries.entry(key).or_insert_with(|| AgeEntry {
            first_seen_secs: now_secs,
            last_observed_secs: now_secs,
            payload,
            observed_this_cycle: true,
        });
        entry.last_observed_secs = now_secs;
        entry.observed_this_cycle = true;
        entry
    }

    pub fn get(&self, key: &K) -> Option<&AgeEntry<V>> {
        self.entries.get(key)
    }

    /// Age of `key` in seconds as of `now_secs`, or `None` if untracked.
    pub fn age_secs(&self, key: &K, now_secs: u64) -> Option<u64> {
        self.entries.get(key).map(|e| e.age_secs(now_secs))
    }

    /// Whether `key` has been continuously flagged for at least
    /// `threshold_secs`.
    pub fn exceeds_threshold(&self, key: &K, now_secs: u64, threshold_secs: u64) -> bool {
        self.age_secs(key, now_secs).is_some_and(|age| age >= threshold_secs)
    }

    /// Clear every entry's per-cycle observation marker. Call once at the
    /// start of a Scale-Down Loop pass, before re-scanning candidates.
    pub fn begin_cycle(&mut self) {
        for entry in self.entries.values_mut() {
            entry.observed_this_cycle = false;
        }
    }

    /// Drop every entry that was not re-observed since the last
    /// [`Self::begin_cycle`] call, returning their keys. Call once at the end
    /// of a pass.
    pub fn evict_unobserved(&mut self) -> Vec<K> {
        let stale: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, e)| !e.observed_this_cycle)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &stale {
            self.entries.remove(key);
        }
        stale
    }

    /// Iterate all tracked entries, regardless of this cycle's observation
    /// state. Callers needing threshold-based actions (§4.5 step 4) collect
    /// from this before mutating the table or performing I/O.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &AgeEntry<V>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "age_tests.rs"]
mod tests;
