// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Revert a network policy and confirm it is retracted from every node.

pub mod client;
pub mod orchestrator;
pub mod poller;
pub mod reporter;

pub use client::{ControlPlane, EnactmentReader, PolicyClient, SubmitAck};
pub use orchestrator::{RevertOrchestrator, RevertRequest, RevertState};
pub use poller::{ConvergenceResult, StatusPoller};
