// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn acquires_and_releases_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("controller.lock");
    {
        let lock = ProcessLock::acquire(&path).unwrap();
        assert_eq!(lock.path(), path);
    }
    // lock dropped, file still exists but is no longer held
    let _again = ProcessLock::acquire(&path).unwrap();
}

#[test]
fn second_acquire_while_held_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("controller.lock");
    let _first = ProcessLock::acquire(&path).unwrap();
    let second = ProcessLock::acquire(&path);
    assert!(matches!(second, Err(LockError::AlreadyRunning(_))));
}

#[test]
fn creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("controller.lock");
    let lock = ProcessLock::acquire(&path).unwrap();
    assert!(lock.path().exists());
}
