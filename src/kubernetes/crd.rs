// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! API discovery and CRD removal

use crate::constants::nmstate::{GROUP, POLICY_KIND, POLICY_VERSION};
use crate::error::Result;
use crate::kubernetes::delete_if_present;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{discovery::Discovery, Api, Client};
use tracing::{debug, info, instrument};

/// Check whether the policy API (nmstate.io/v1 NodeNetworkConfigurationPolicy) is served.
pub async fn policy_api_served(client: &Client) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[GROUP])
        .run()
        .await?;

    for group in discovery.groups() {
        if group.name() == GROUP {
            for (ar, _) in group.recommended_resources() {
                if ar.kind == POLICY_KIND && ar.version == POLICY_VERSION {
                    debug!("{}/{} {} is served", GROUP, POLICY_VERSION, POLICY_KIND);
                    return Ok(true);
                }
            }
        }
    }

    Ok(false)
}

/// Delete a CustomResourceDefinition by name; an absent CRD is not an error
#[instrument(skip(client))]
pub async fn delete_crd(client: &Client, name: &str) -> Result<bool> {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let deleted = delete_if_present(&crds, name).await?;
    if deleted {
        info!("Deleted CRD {}", name);
    } else {
        debug!("CRD {} already absent", name);
    }
    Ok(deleted)
}
