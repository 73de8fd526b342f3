// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! runner-cloud: the cloud provider seam.
//!
//! A production server-management backend and a fake one for tests sit
//! behind [`CloudProvider`]; the Provisioner, Recycler, and both convergence
//! loops depend on the trait, never on a concrete backend.

pub mod error;
pub mod hetzner;
pub mod model;
pub mod provider;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use error::CloudError;
pub use hetzner::HetznerProvider;
pub use model::{CloudServer, CloudServerStatus, CreateServerSpec, NetSpec, SshKey, UpdateServerSpec};
pub use provider::CloudProvider;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{CloudCall, FakeCloudProvider};
