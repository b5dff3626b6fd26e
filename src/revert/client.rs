// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Control-plane seams used by the poller and orchestrator.

use crate::error::Result;
use crate::types::{Enactment, Policy};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

/// Acknowledgement of a submitted policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubmitAck {
    /// Generation the control plane assigned to the stored policy
    pub generation: Option<i64>,
}

/// Create, read and delete policies
#[async_trait]
pub trait PolicyClient: Send + Sync {
    /// Create or replace the named policy. Submitting the same document twice is a no-op.
    async fn submit(&self, policy: &Policy) -> Result<SubmitAck>;

    /// Delete the named policy. Deleting an absent policy succeeds.
    async fn delete(&self, name: &str) -> Result<()>;

    async fn get(&self, name: &str) -> Result<Option<Policy>>;
}

/// Read per-node enactment status and node membership
#[async_trait]
pub trait EnactmentReader: Send + Sync {
    async fn list_enactments(&self, policy_name: &str) -> Result<Vec<Enactment>>;

    /// Names of the nodes matched by a node selector; an empty selector matches all nodes
    async fn selected_nodes(
        &self,
        selector: &BTreeMap<String, String>,
    ) -> Result<BTreeSet<String>>;
}

/// Everything a revert run needs from the control plane
pub trait ControlPlane: PolicyClient + EnactmentReader {}

impl<T: PolicyClient + EnactmentReader + ?Sized> ControlPlane for T {}
