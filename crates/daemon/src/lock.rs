// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance process ownership via an exclusive file lock (§3
//! Invariants: "at most one controller process owns the fleet").

use fs2::FileExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another controller instance is already running (lock held on {0})")]
    AlreadyRunning(PathBuf),
    #[error("io error acquiring lock {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

/// Held for the lifetime of the process; dropping it releases the lock.
pub struct ProcessLock {
    _file: std::fs::File,
    path: PathBuf,
}

impl ProcessLock {
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| LockError::Io { path: path.to_path_buf(), source })?;
        }
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| LockError::Io { path: path.to_path_buf(), source })?;
        file.try_lock_exclusive().map_err(|_| LockError::AlreadyRunning(path.to_path_buf()))?;
        file.set_len(0).map_err(|source| LockError::Io { path: path.to_path_buf(), source })?;
        writeln!(file, "{}", std::process::id())
            .map_err(|source| LockError::Io { path: path.to_path_buf(), source })?;
        Ok(Self { _file: file, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
