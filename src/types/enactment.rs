// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-node enactment records reported by the operator.
//!
//! Enactments have no spec, so they are read as dynamic objects and their
//! status is decoded here.

use crate::constants::{conditions, labels, nmstate};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a node stands in realizing a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Progressing,
    Available,
    Failed,
    Aborted,
}

impl Phase {
    /// Failed and Aborted end the run for this node without success
    pub fn is_failure(&self) -> bool {
        matches!(self, Phase::Failed | Phase::Aborted)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Pending => "Pending",
            Phase::Progressing => "Progressing",
            Phase::Available => "Available",
            Phase::Failed => "Failed",
            Phase::Aborted => "Aborted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enactment {
    pub node_name: String,
    pub policy_name: String,
    pub phase: Phase,
    pub last_transition_time: Option<String>,
    pub message: Option<String>,
    pub policy_generation: Option<i64>,
}

impl Enactment {
    /// An enactment is stale when it reports on an older generation of the policy
    pub fn is_stale(&self, generation: Option<i64>) -> bool {
        match (self.policy_generation, generation) {
            (Some(seen), Some(current)) => seen < current,
            _ => false,
        }
    }

    /// Decode an enactment object; returns None when it does not belong to `policy_name`
    pub fn from_dynamic(obj: &DynamicObject, policy_name: &str) -> Option<Self> {
        let name = obj.name_any();
        let obj_labels = obj.labels();

        if let Some(owner) = obj_labels.get(labels::ENACTMENT_POLICY) {
            if owner != policy_name {
                return None;
            }
        }

        let node_name = match obj_labels.get(labels::ENACTMENT_NODE) {
            Some(node) => node.clone(),
            None => name
                .strip_suffix(&format!(".{}", policy_name))
                .map(str::to_string)?,
        };

        let status: EnactmentStatus = obj
            .data
            .get("status")
            .cloned()
            .and_then(|s| serde_json::from_value(s).ok())
            .unwrap_or_default();

        let deciding = status.deciding_condition();

        Some(Enactment {
            node_name,
            policy_name: policy_name.to_string(),
            phase: status.phase(),
            last_transition_time: deciding.and_then(|c| c.last_transition_time.clone()),
            message: deciding.and_then(|c| c.message.clone()),
            policy_generation: status.policy_generation,
        })
    }
}

/// The API resource used to list enactments dynamically
pub fn enactment_resource() -> ApiResource {
    let gvk = GroupVersionKind::gvk(
        nmstate::GROUP,
        nmstate::ENACTMENT_VERSION,
        nmstate::ENACTMENT_KIND,
    );
    ApiResource::from_gvk_with_plural(&gvk, nmstate::ENACTMENT_PLURAL)
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnactmentStatus {
    #[serde(default)]
    pub conditions: Vec<EnactmentCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_generation: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EnactmentCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

const PHASE_ORDER: [(&str, Phase); 4] = [
    (conditions::FAILING, Phase::Failed),
    (conditions::ABORTED, Phase::Aborted),
    (conditions::AVAILABLE, Phase::Available),
    (conditions::PROGRESSING, Phase::Progressing),
];

impl EnactmentStatus {
    fn is_true(&self, condition_type: &str) -> bool {
        self.conditions
            .iter()
            .any(|c| c.condition_type == condition_type && c.status == "True")
    }

    pub fn phase(&self) -> Phase {
        PHASE_ORDER
            .iter()
            .find(|(condition_type, _)| self.is_true(condition_type))
            .map(|(_, phase)| *phase)
            .unwrap_or(Phase::Pending)
    }

    /// The condition that decided the phase, used for its message and timestamp
    fn deciding_condition(&self) -> Option<&EnactmentCondition> {
        let decided_by = PHASE_ORDER
            .iter()
            .map(|(condition_type, _)| *condition_type)
            .find(|condition_type| self.is_true(condition_type))
            .unwrap_or(conditions::PENDING);

        self.conditions
            .iter()
            .find(|c| c.condition_type == decided_by)
    }
}
