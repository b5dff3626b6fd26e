// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes access: the policy client, API discovery, and operator resources.

pub mod crd;
pub mod namespaces;
pub mod olm;
pub mod policies;

pub use crd::{delete_crd, policy_api_served};
pub use namespaces::delete_namespace;
pub use policies::KubePolicyClient;

use crate::error::Result;
use kube::api::{Api, DeleteParams};
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Delete an object, treating "not found" as already deleted.
/// Returns whether a delete was actually issued.
pub async fn delete_if_present<K>(api: &Api<K>, name: &str) -> Result<bool>
where
    K: Clone + DeserializeOwned + Debug,
{
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(true),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(false),
        Err(e) => Err(e.into()),
    }
}
