// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[kube(
    group = "nmstate.io",
    version = "v1",
    kind = "NodeNetworkConfigurationPolicy",
    shortname = "nncp"
)]
#[kube(status = "PolicyStatus")]
#[serde(rename_all = "camelCase")]
pub struct PolicySpec {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,
    #[serde(default)]
    pub desired_state: serde_json::Value,
}

pub type Policy = NodeNetworkConfigurationPolicy;

impl NodeNetworkConfigurationPolicy {
    /// Build a temporary policy that reverts configuration on the selected nodes
    pub fn revert(
        name: &str,
        node_selector: BTreeMap<String, String>,
        desired_state: serde_json::Value,
    ) -> Self {
        Policy::new(
            name,
            PolicySpec {
                node_selector,
                desired_state,
            },
        )
    }

    /// Whether this policy asks the operator to drop its DNS resolver configuration.
    /// An empty `dns-resolver.config` is a removal request, not a no-op.
    pub fn is_dns_revert(&self) -> bool {
        self.spec
            .desired_state
            .get("dns-resolver")
            .and_then(|r| r.get("config"))
            .and_then(|c| c.as_object())
            .is_some_and(|c| c.is_empty())
    }

    pub fn generation(&self) -> Option<i64> {
        self.metadata.generation
    }

    /// Render the node selector as a label selector query string
    pub fn label_selector(&self) -> String {
        selector_string(&self.spec.node_selector)
    }

    pub fn describe(&self) -> String {
        format!("{} (nodeSelector: {:?})", self.name_any(), self.spec.node_selector)
    }
}

/// The empty-state document understood by the operator as "remove prior DNS configuration"
pub fn empty_dns_state() -> serde_json::Value {
    json!({ "dns-resolver": { "config": {} } })
}

pub fn selector_string(selector: &BTreeMap<String, String>) -> String {
    selector
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<PolicyCondition>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
