// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] runner_daemon::ConfigError),
    #[error(transparent)]
    Cloud(#[from] runner_cloud::CloudError),
    #[error(transparent)]
    Scm(#[from] runner_scm::ScmError),
    #[error("server not found: {0}")]
    ServerNotFound(String),
    #[error("server {name} is not running (status: {status})")]
    ServerNotRunning { name: String, status: String },
    #[error("failed to spawn ssh: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type CliResult<T> = Result<T, CliError>;
