// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner labels: case-folded tokens that describe a job's requirements.
//!
//! A label is a case-folded string (§3). Label sets are plain sets — order
//! never matters for matching, only membership.

use smol_str::SmolStr;
use std::collections::{BTreeMap, BTreeSet};

/// A single case-folded runner label.
pub type Label = SmolStr;

/// A set of runner labels. `BTreeSet` gives deterministic iteration, which
/// keeps the Label Resolver's "pure function, byte-for-byte identical
/// output" property (§8) easy to test.
pub type LabelSet = BTreeSet<Label>;

/// Fold a label to the canonical lower-case form used everywhere labels are
/// compared or stored.
pub fn fold(label: &str) -> Label {
    Label::new(label.to_lowercase())
}

/// Build a label set from any iterator of strings, case-folding each entry.
pub fn label_set<I, S>(labels: I) -> LabelSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    labels.into_iter().map(|l| fold(l.as_ref())).collect()
}

/// A meta-label expansion map: meta-label name -> set of labels it expands to.
pub type MetaLabelMap = BTreeMap<Label, LabelSet>;

/// Expand every occurrence of a meta-label name in `labels` into its stored
/// set, folding names against `label_prefix` first (§4.1 Expand).
///
/// The result always contains the original (folded) labels plus any
/// expansions; it is deduplicated because it is a set.
pub fn expand_meta_labels(meta_labels: &MetaLabelMap, labels: &LabelSet, label_prefix: &str) -> LabelSet {
    let prefix = label_prefix.to_lowercase();
    let mut expanded = LabelSet::new();

    for label in labels {
        expanded.insert(label.clone());

        let raw = if prefix.is_empty() {
            label.as_str()
        } else {
            label.as_str().strip_prefix(prefix.as_str()).unwrap_or(label.as_str())
        };

        if let Some(set) = meta_labels.get(&fold(raw)) {
            expanded.extend(set.iter().cloned());
        }
    }

    expanded
}

/// Reject the job if it is missing any of `required`. Returns `true` when
/// all required labels are present (§4.1 Filter).
pub fn has_required_labels(labels: &LabelSet, required: &LabelSet) -> bool {
    required.is_subset(labels)
}

/// Returns true if `labels` is a superset of `desired` — the "expected to
/// be picked up" / standby-pool matching test used throughout §4.4/§4.5.
pub fn covers(labels: &LabelSet, desired: &LabelSet) -> bool {
    desired.is_subset(labels)
}

#[cfg(test)]
#[path = "label_tests.rs"]
mod tests;
