// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management utilities

use crate::error::Result;
use crate::kubernetes::delete_if_present;
use k8s_openapi::api::core::v1::Namespace;
use kube::{Api, Client};
use tracing::{debug, info, instrument};

/// Delete a namespace if it exists. Returns whether a delete was issued.
#[instrument(skip(client))]
pub async fn delete_namespace(client: &Client, namespace: &str) -> Result<bool> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    let deleted = delete_if_present(&namespaces, namespace).await?;
    if deleted {
        info!("Namespace {} marked for deletion", namespace);
    } else {
        debug!("Namespace {} already absent", namespace);
    }
    Ok(deleted)
}
