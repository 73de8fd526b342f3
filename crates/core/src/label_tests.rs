// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fold_lowercases() {
    assert_eq!(fold("Self-Hosted"), Label::new("self-hosted"));
}

#[test]
fn label_set_dedupes_after_folding() {
    let set = label_set(["Type-cpx21", "type-CPX21"]);
    assert_eq!(set.len(), 1);
}

#[test]
fn expand_meta_labels_adds_expansion_without_dropping_original() {
    let mut meta = MetaLabelMap::new();
    meta.insert(fold("gpu"), label_set(["type-ccx63", "image-x64-system-ubuntu"]));

    let labels = label_set(["self-hosted", "gpu"]);
    let expanded = expand_meta_labels(&meta, &labels, "");

    assert!(expanded.contains(&fold("gpu")));
    assert!(expanded.contains(&fold("self-hosted")));
    assert!(expanded.contains(&fold("type-ccx63")));
    assert!(expanded.contains(&fold("image-x64-system-ubuntu")));
}

#[test]
fn expand_meta_labels_respects_label_prefix() {
    let mut meta = MetaLabelMap::new();
    meta.insert(fold("gpu"), label_set(["oj-type-ccx63"]));

    let labels = label_set(["oj-gpu"]);
    let expanded = expand_meta_labels(&meta, &labels, "oj-");

    assert!(expanded.contains(&fold("oj-type-ccx63")));
}

#[test]
fn has_required_labels_checks_subset() {
    let required = label_set(["self-hosted"]);
    assert!(has_required_labels(&label_set(["self-hosted", "type-cpx21"]), &required));
    assert!(!has_required_labels(&label_set(["type-cpx21"]), &required));
}

#[test]
fn covers_is_superset_test() {
    let desired = label_set(["self-hosted", "type-cpx21"]);
    assert!(covers(&label_set(["self-hosted", "type-cpx21", "in-nbg1"]), &desired));
    assert!(!covers(&label_set(["self-hosted"]), &desired));
}
