// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Control-plane resources and run results.

pub mod enactment;
pub mod outcome;
pub mod policy;

pub use enactment::{Enactment, Phase};
pub use outcome::{Outcome, RunReport, TaskOutcome};
pub use policy::{NodeNetworkConfigurationPolicy, Policy, PolicySpec};
