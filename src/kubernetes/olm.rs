// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Operator Lifecycle Manager resources (Subscription, ClusterServiceVersion)

use crate::constants::olm;
use crate::error::Result;
use crate::kubernetes::delete_if_present;
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client};
use tracing::{debug, info, instrument};

fn olm_resource(kind: &str, plural: &str) -> ApiResource {
    let gvk = GroupVersionKind::gvk(olm::GROUP, olm::VERSION, kind);
    ApiResource::from_gvk_with_plural(&gvk, plural)
}

fn subscriptions(client: &Client, namespace: &str) -> Api<DynamicObject> {
    let ar = olm_resource(olm::SUBSCRIPTION_KIND, olm::SUBSCRIPTION_PLURAL);
    Api::namespaced_with(client.clone(), namespace, &ar)
}

fn csvs(client: &Client, namespace: &str) -> Api<DynamicObject> {
    let ar = olm_resource(olm::CSV_KIND, olm::CSV_PLURAL);
    Api::namespaced_with(client.clone(), namespace, &ar)
}

/// Name of the ClusterServiceVersion a subscription installed, if the subscription exists
#[instrument(skip(client))]
pub async fn installed_csv(
    client: &Client,
    namespace: &str,
    subscription: &str,
) -> Result<Option<String>> {
    let Some(sub) = subscriptions(client, namespace).get_opt(subscription).await? else {
        debug!("Subscription {}/{} not found", namespace, subscription);
        return Ok(None);
    };

    Ok(sub
        .data
        .get("status")
        .and_then(|s| s.get("installedCSV"))
        .and_then(|v| v.as_str())
        .map(str::to_string))
}

#[instrument(skip(client))]
pub async fn delete_subscription(client: &Client, namespace: &str, name: &str) -> Result<bool> {
    let deleted = delete_if_present(&subscriptions(client, namespace), name).await?;
    if deleted {
        info!("Deleted subscription {}/{}", namespace, name);
    }
    Ok(deleted)
}

#[instrument(skip(client))]
pub async fn delete_csv(client: &Client, namespace: &str, name: &str) -> Result<bool> {
    let deleted = delete_if_present(&csvs(client, namespace), name).await?;
    if deleted {
        info!("Deleted ClusterServiceVersion {}/{}", namespace, name);
    }
    Ok(deleted)
}
