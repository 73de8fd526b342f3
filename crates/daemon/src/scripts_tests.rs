// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn existing_file_is_found() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("setup.sh"), b"#!/bin/sh\n").unwrap();
    let scripts = FsScripts::new(dir.path());
    assert!(scripts.exists("setup.sh"));
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let scripts = FsScripts::new(dir.path());
    assert!(!scripts.exists("startup-x64.sh"));
}
