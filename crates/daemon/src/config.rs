// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration loading: a TOML file on disk with secret fields
//! overridable from the environment, mirroring the teacher daemon's
//! env-var-first approach to anything that shouldn't be committed to disk.

use runner_core::label::MetaLabelMap;
use runner_core::resolver::Defaults;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
    #[error("missing required secret: set {0}")]
    MissingSecret(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandbyConfig {
    pub labels: BTreeSet<String>,
    pub count: u32,
    #[serde(default)]
    pub replenish_immediately: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Runner-label prefix, e.g. `"runner"` — the scope marker, SSH-key
    /// binding, and capability-index keys are all derived from this (§6.1).
    #[serde(default = "default_runner_label")]
    pub runner_label: String,
    /// Required label set every handled job must carry (§3 Runner Label).
    #[serde(default = "default_required_labels")]
    pub required_labels: BTreeSet<String>,
    /// Capability prefix applied ahead of `type-`/`in-`/... tags.
    #[serde(default)]
    pub label_prefix: String,
    #[serde(default)]
    pub meta_labels: MetaLabelMap,
    #[serde(default)]
    pub defaults: Defaults,

    pub github_repository: String,
    #[serde(default)]
    pub github_token: Option<String>,
    #[serde(default)]
    pub hetzner_token: Option<String>,

    pub ssh_key_name: String,
    pub ssh_key_fingerprint: String,

    #[serde(default)]
    pub standby: Vec<StandbyConfig>,

    #[serde(default = "default_max_runners_in_workflow_run")]
    pub max_runners_in_workflow_run: Option<u32>,
    #[serde(default)]
    pub max_runners: Option<u32>,

    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_scale_up_interval_secs")]
    pub scale_up_interval_secs: u64,
    #[serde(default = "default_scale_down_interval_secs")]
    pub scale_down_interval_secs: u64,

    #[serde(default = "default_max_powered_off_secs")]
    pub max_powered_off_time_secs: u64,
    #[serde(default = "default_max_runner_registration_secs")]
    pub max_runner_registration_time_secs: u64,
    #[serde(default = "default_max_unused_runner_secs")]
    pub max_unused_runner_time_secs: u64,
    #[serde(default = "default_max_server_ready_secs")]
    pub max_server_ready_time_secs: u64,

    #[serde(default = "default_end_of_life_minutes")]
    pub end_of_life_minutes: u64,
    #[serde(default = "default_recycle")]
    pub recycle: bool,
}

fn default_runner_label() -> String {
    "runner".to_string()
}
fn default_required_labels() -> BTreeSet<String> {
    BTreeSet::from(["self-hosted".to_string()])
}
fn default_max_runners_in_workflow_run() -> Option<u32> {
    Some(10)
}
fn default_workers() -> usize {
    10
}
fn default_scale_up_interval_secs() -> u64 {
    15
}
fn default_scale_down_interval_secs() -> u64 {
    30
}
fn default_max_powered_off_secs() -> u64 {
    300
}
fn default_max_runner_registration_secs() -> u64 {
    600
}
fn default_max_unused_runner_secs() -> u64 {
    600
}
fn default_max_server_ready_secs() -> u64 {
    120
}
fn default_end_of_life_minutes() -> u64 {
    50
}
fn default_recycle() -> bool {
    true
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        let mut config: Config = toml::from_str(&raw)
            .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Secrets are allowed to live outside the config file entirely
    /// (`RUNNER_GITHUB_TOKEN`, `RUNNER_HETZNER_TOKEN`), matching the
    /// teacher daemon's environment-variable-first handling of anything
    /// that shouldn't be committed to disk.
    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("RUNNER_GITHUB_TOKEN") {
            self.github_token = Some(token);
        }
        if let Ok(token) = std::env::var("RUNNER_HETZNER_TOKEN") {
            self.hetzner_token = Some(token);
        }
    }

    pub fn github_token(&self) -> Result<&str, ConfigError> {
        self.github_token.as_deref().ok_or(ConfigError::MissingSecret("RUNNER_GITHUB_TOKEN"))
    }

    pub fn hetzner_token(&self) -> Result<&str, ConfigError> {
        self.hetzner_token.as_deref().ok_or(ConfigError::MissingSecret("RUNNER_HETZNER_TOKEN"))
    }

    pub fn scale_up_interval(&self) -> Duration {
        Duration::from_secs(self.scale_up_interval_secs)
    }

    pub fn scale_down_interval(&self) -> Duration {
        Duration::from_secs(self.scale_down_interval_secs)
    }

    pub fn max_powered_off_time(&self) -> Duration {
        Duration::from_secs(self.max_powered_off_time_secs)
    }

    pub fn max_runner_registration_time(&self) -> Duration {
        Duration::from_secs(self.max_runner_registration_time_secs)
    }

    pub fn max_unused_runner_time(&self) -> Duration {
        Duration::from_secs(self.max_unused_runner_time_secs)
    }

    pub fn max_server_ready_time(&self) -> Duration {
        Duration::from_secs(self.max_server_ready_time_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
