// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Policy client backed by the Kubernetes API

use crate::constants::{labels, FIELD_MANAGER};
use crate::error::Result;
use crate::kubernetes::delete_if_present;
use crate::revert::{EnactmentReader, PolicyClient, SubmitAck};
use crate::types::enactment::enactment_resource;
use crate::types::policy::selector_string;
use crate::types::{Enactment, Policy};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::core::DynamicObject;
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument};

pub struct KubePolicyClient {
    client: Client,
}

impl KubePolicyClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn policies(&self) -> Api<Policy> {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl PolicyClient for KubePolicyClient {
    #[instrument(skip(self, policy), fields(policy = %policy.name_any()))]
    async fn submit(&self, policy: &Policy) -> Result<SubmitAck> {
        let pp = PatchParams::apply(FIELD_MANAGER).force();
        let applied = self
            .policies()
            .patch(&policy.name_any(), &pp, &Patch::Apply(policy))
            .await?;

        debug!(generation = ?applied.generation(), "Policy applied");
        Ok(SubmitAck {
            generation: applied.generation(),
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, name: &str) -> Result<()> {
        if delete_if_present(&self.policies(), name).await? {
            info!("Deleted policy {}", name);
        } else {
            debug!("Policy {} already absent", name);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, name: &str) -> Result<Option<Policy>> {
        Ok(self.policies().get_opt(name).await?)
    }
}

#[async_trait]
impl EnactmentReader for KubePolicyClient {
    #[instrument(skip(self))]
    async fn list_enactments(&self, policy_name: &str) -> Result<Vec<Enactment>> {
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &enactment_resource());
        let lp = ListParams::default().labels(&format!(
            "{}={}",
            labels::ENACTMENT_POLICY,
            policy_name
        ));
        let list = api.list(&lp).await?;

        Ok(list
            .items
            .iter()
            .filter_map(|obj| Enactment::from_dynamic(obj, policy_name))
            .collect())
    }

    #[instrument(skip(self))]
    async fn selected_nodes(
        &self,
        selector: &BTreeMap<String, String>,
    ) -> Result<BTreeSet<String>> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let mut lp = ListParams::default();
        if !selector.is_empty() {
            lp = lp.labels(&selector_string(selector));
        }
        let list = nodes.list(&lp).await?;

        Ok(list.items.iter().map(|n| n.name_any()).collect())
    }
}
