// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Label Resolver (§4.1): a pure mapping from a job's label set to a
//! [`DesiredShape`].
//!
//! Both convergence loops call [`resolve`] with the same inputs and must
//! agree — this is the single source of the "what does this job want"
//! contract. The function does no I/O; script existence is checked through
//! the caller-supplied [`Scripts`] lookup so the core crate stays free of
//! filesystem access.

use crate::label::{self, LabelSet, MetaLabelMap};
use crate::shape::{DesiredShape, ImageKind, ImageRef, NetConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-slot defaults used when a job doesn't name a capability label for
/// that slot (§4.1 Default).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    pub server_type: String,
    pub location: Option<String>,
    pub image: ImageRef,
    pub setup_script: String,
    pub startup_script_template: String,
    /// ARM64 server-type name marker, e.g. `"ca"` (CAX11, CAX21, ...).
    pub arm_marker: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            server_type: "cpx11".to_string(),
            location: None,
            image: ImageRef {
                architecture: "x86".to_string(),
                kind: ImageKind::System,
                name: "ubuntu-22.04".to_string(),
            },
            setup_script: "setup.sh".to_string(),
            startup_script_template: "startup-{arch}.sh".to_string(),
            arm_marker: "ca".to_string(),
        }
    }
}

/// A filesystem lookup for setup/startup scripts, injected so this crate
/// never touches the filesystem directly.
pub trait Scripts: Send + Sync {
    /// Returns true if a script with this file name exists and is usable.
    fn exists(&self, file_name: &str) -> bool;
}

/// A `Scripts` implementation that accepts every name — useful for tests
/// that don't care about script validation.
pub struct AllScripts;

impl Scripts for AllScripts {
    fn exists(&self, _file_name: &str) -> bool {
        true
    }
}

/// Inputs to the Label Resolver.
pub struct ResolverInputs<'a> {
    pub label_prefix: &'a str,
    pub meta_labels: &'a MetaLabelMap,
    pub defaults: &'a Defaults,
    pub job_labels: &'a LabelSet,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("unknown script: {0}")]
    UnknownScript(String),
}

fn prefixed(label_prefix: &str, suffix: &str) -> String {
    let mut prefix = label_prefix.to_lowercase();
    if !prefix.is_empty() && !prefix.ends_with('-') {
        prefix.push('-');
    }
    prefix.push_str(suffix);
    prefix
}

fn find_suffix(labels: &LabelSet, tag_prefix: &str) -> Option<String> {
    labels
        .iter()
        .filter_map(|l| l.as_str().strip_prefix(tag_prefix).map(|s| s.to_string()))
        .last()
}

fn server_arch(server_type: &str, arm_marker: &str) -> &'static str {
    if server_type.to_lowercase().starts_with(&arm_marker.to_lowercase()) {
        "arm64"
    } else {
        "x64"
    }
}

/// Resolve a job's (already expanded) label set into a [`DesiredShape`].
///
/// Performs Expand, Parse, Default, and Result (§4.1); Filter is the
/// caller's responsibility via [`label::has_required_labels`], since the two
/// convergence loops apply it at different points in their own control flow.
pub fn resolve(inputs: ResolverInputs<'_>, scripts: &dyn Scripts) -> Result<DesiredShape, ResolveError> {
    let expanded = label::expand_meta_labels(inputs.meta_labels, inputs.job_labels, inputs.label_prefix);

    let type_tag = prefixed(inputs.label_prefix, "type-");
    let server_type =
        find_suffix(&expanded, &type_tag).unwrap_or_else(|| inputs.defaults.server_type.clone());

    let loc_tag = prefixed(inputs.label_prefix, "in-");
    let location = find_suffix(&expanded, &loc_tag).or_else(|| inputs.defaults.location.clone());

    let image_tag = prefixed(inputs.label_prefix, "image-");
    let image = match find_suffix(&expanded, &image_tag) {
        Some(rest) => parse_image(&rest).unwrap_or_else(|| inputs.defaults.image.clone()),
        None => inputs.defaults.image.clone(),
    };

    let setup_tag = prefixed(inputs.label_prefix, "setup-");
    let setup_script = match find_suffix(&expanded, &setup_tag) {
        Some(name) => format!("{name}.sh"),
        None => inputs.defaults.setup_script.clone(),
    };
    if !scripts.exists(&setup_script) {
        return Err(ResolveError::UnknownScript(setup_script));
    }

    let arch = server_arch(&server_type, &inputs.defaults.arm_marker);
    let startup_tag = prefixed(inputs.label_prefix, "startup-");
    let startup_script = match find_suffix(&expanded, &startup_tag) {
        Some(name) => format!("{name}.sh"),
        None => inputs.defaults.startup_script_template.replace("{arch}", arch),
    };
    if !scripts.exists(&startup_script) {
        return Err(ResolveError::UnknownScript(startup_script));
    }

    let net_tag = prefixed(inputs.label_prefix, "net-");
    let net_ipv4_label = format!("{net_tag}ipv4");
    let net_ipv6_label = format!("{net_tag}ipv6");
    let mut net_config = NetConfig {
        ipv4: expanded.iter().any(|l| l.as_str() == net_ipv4_label),
        ipv6: expanded.iter().any(|l| l.as_str() == net_ipv6_label),
    };
    if !net_config.ipv4 && !net_config.ipv6 {
        net_config = NetConfig::both();
    }

    Ok(DesiredShape {
        server_type,
        location,
        image,
        setup_script,
        startup_script,
        net_config,
        label_set: expanded,
    })
}

fn parse_image(rest: &str) -> Option<ImageRef> {
    // `<arch>-<kind>-<name>`, name may itself contain dashes.
    let mut parts = rest.splitn(3, '-');
    let architecture = parts.next()?.to_string();
    let kind_str = parts.next()?;
    let name = parts.next()?.to_string();
    let kind = ImageKind::parse(kind_str)?;
    Some(ImageRef { architecture, kind, name })
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
