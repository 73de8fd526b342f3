// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScmError {
    #[error("source-control request failed: {0}")]
    Request(String),
    #[error("source-control returned malformed response: {0}")]
    Decode(String),
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("runner not found: {0}")]
    RunnerNotFound(String),
}
