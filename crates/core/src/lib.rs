// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! runner-core: shared data model for the runner fleet controller.
//!
//! Pure types and pure functions only — no network I/O, no clock reads other
//! than through [`Clock`]. Both convergence loops (scale-up, scale-down)
//! depend on this crate so that they agree on what a job "wants" and how a
//! server's capability labels are encoded.

pub mod age;
pub mod clock;
pub mod failure;
pub mod id;
pub mod label;
pub mod macros;
pub mod names;
pub mod resolver;
pub mod runner;
pub mod server;
pub mod shape;
pub mod standby;

pub use age::AgeTable;
pub use clock::{Clock, FakeClock, SystemClock};
pub use failure::{MailboxMessage, ScaleUpFailureRecord};
pub use id::short;
pub use label::{Label, LabelSet};
pub use names::{NamePrefixes, ServerRole};
pub use resolver::{resolve, ResolveError, ResolverInputs, Scripts};
pub use runner::{Runner, RunnerStatus};
pub use server::{CapabilityLabels, LabelSchema, Server, ServerLifecycle, ServerStatus};
pub use shape::{DesiredShape, NetConfig};
pub use standby::StandbyDeclaration;
