// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mocked Kubernetes API and an in-memory control plane.

use crate::error::{ClientError, Result};
use crate::revert::{EnactmentReader, PolicyClient, SubmitAck};
use crate::types::policy::empty_dns_state;
use crate::types::{Enactment, Phase, Policy};
use async_trait::async_trait;
use http::{Request, Response};
use kube::client::Body;
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for PATCH requests (server-side apply) matching the path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    /// Add a response for DELETE requests matching the path
    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        // Try exact match first
        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        // Then the longest registered prefix
        responses
            .iter()
            .filter(|((m, p), _)| m == method && path.starts_with(p.as_str()))
            .max_by_key(|((_, p), _)| p.len())
            .map(|(_, resp)| resp.clone())
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let (status, body) = self
            .find_response(&method, &path)
            .unwrap_or_else(|| (404, not_found_json("resource", &path)));

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// A Status response for a failed request
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(
        404,
        "NotFound",
        &format!("{} \"{}\" not found", resource, name),
    )
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        },
        "status": { "phase": "Terminating" }
    })
    .to_string()
}

/// A stored revert policy at the given generation
pub fn policy_json(name: &str, generation: i64) -> String {
    serde_json::json!({
        "apiVersion": "nmstate.io/v1",
        "kind": "NodeNetworkConfigurationPolicy",
        "metadata": {
            "name": name,
            "generation": generation,
            "uid": "test-uid"
        },
        "spec": {
            "desiredState": empty_dns_state()
        }
    })
    .to_string()
}

/// An enactment list for a policy; each entry is (node, condition type that is True)
pub fn enactment_list_json(policy: &str, entries: &[(&str, &str)]) -> String {
    let items: Vec<_> = entries
        .iter()
        .map(|(node, condition)| {
            serde_json::json!({
                "apiVersion": "nmstate.io/v1beta1",
                "kind": "NodeNetworkConfigurationEnactment",
                "metadata": {
                    "name": format!("{}.{}", node, policy),
                    "labels": { "nmstate.io/policy": policy }
                },
                "status": {
                    "policyGeneration": 1,
                    "conditions": [{
                        "type": condition,
                        "status": "True",
                        "message": format!("{} on {}", condition, node)
                    }]
                }
            })
        })
        .collect();

    serde_json::json!({
        "apiVersion": "nmstate.io/v1beta1",
        "kind": "NodeNetworkConfigurationEnactmentList",
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}

pub fn node_list_json(names: &[&str]) -> String {
    let items: Vec<_> = names
        .iter()
        .map(|name| {
            serde_json::json!({
                "apiVersion": "v1",
                "kind": "Node",
                "metadata": { "name": name }
            })
        })
        .collect();

    serde_json::json!({
        "apiVersion": "v1",
        "kind": "NodeList",
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}

pub fn subscription_json(name: &str, installed_csv: Option<&str>) -> String {
    let mut sub = serde_json::json!({
        "apiVersion": "operators.coreos.com/v1alpha1",
        "kind": "Subscription",
        "metadata": { "name": name, "namespace": "openshift-nmstate" },
        "spec": { "name": name, "channel": "stable", "source": "redhat-operators" }
    });
    if let Some(csv) = installed_csv {
        sub["status"] = serde_json::json!({ "installedCSV": csv });
    }
    sub.to_string()
}

/// In-memory control plane. Nodes follow a scripted sequence of phases,
/// one entry per enactment poll of a policy; the last entry repeats.
#[derive(Default)]
pub struct FakeControlPlane {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    policies: BTreeMap<String, Policy>,
    nodes: BTreeMap<String, BTreeMap<String, String>>,
    scripts: HashMap<String, Vec<Phase>>,
    polls_per_policy: HashMap<String, usize>,
    enactment_polls: usize,
    submits: usize,
    deletes: usize,
    submit_errors: VecDeque<ClientError>,
    read_errors: usize,
    get_errors: usize,
    delete_errors: usize,
    keep_deleted: bool,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut FakeState {
        self.state.get_mut().unwrap()
    }

    pub fn with_node(mut self, name: &str, labels: &[(&str, &str)]) -> Self {
        let labels = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.state_mut().nodes.insert(name.to_string(), labels);
        self
    }

    pub fn with_script(mut self, node: &str, phases: &[Phase]) -> Self {
        self.state_mut()
            .scripts
            .insert(node.to_string(), phases.to_vec());
        self
    }

    pub fn with_policy(mut self, mut policy: Policy) -> Self {
        policy.metadata.generation = Some(1);
        self.state_mut().policies.insert(policy.name_any(), policy);
        self
    }

    pub fn with_revert_policy(self, name: &str) -> Self {
        self.with_policy(Policy::revert(name, BTreeMap::new(), empty_dns_state()))
    }

    /// Fail the next `count` submits with `err`
    pub fn fail_submits(mut self, err: ClientError, count: usize) -> Self {
        self.state_mut()
            .submit_errors
            .extend(std::iter::repeat(err).take(count));
        self
    }

    /// Fail the next `count` enactment reads as unavailable
    pub fn fail_enactment_reads(mut self, count: usize) -> Self {
        self.state_mut().read_errors = count;
        self
    }

    /// Fail the next `count` policy reads as unavailable
    pub fn fail_gets(mut self, count: usize) -> Self {
        self.state_mut().get_errors = count;
        self
    }

    /// Fail the next `count` deletes as unavailable
    pub fn fail_deletes(mut self, count: usize) -> Self {
        self.state_mut().delete_errors = count;
        self
    }

    /// Deletes are accepted but the policy stays, like one held by a finalizer
    pub fn keep_deleted_policies(mut self) -> Self {
        self.state_mut().keep_deleted = true;
        self
    }

    pub fn policy(&self, name: &str) -> Option<Policy> {
        self.state.lock().unwrap().policies.get(name).cloned()
    }

    /// Successful enactment reads across all policies
    pub fn enactment_polls(&self) -> usize {
        self.state.lock().unwrap().enactment_polls
    }

    pub fn submit_count(&self) -> usize {
        self.state.lock().unwrap().submits
    }

    pub fn delete_count(&self) -> usize {
        self.state.lock().unwrap().deletes
    }
}

fn unavailable(pending: &mut usize, what: &str) -> Result<()> {
    if *pending > 0 {
        *pending -= 1;
        return Err(ClientError::ControlPlaneUnavailable(format!(
            "fake {} failure",
            what
        )));
    }
    Ok(())
}

fn selector_matches(selector: &BTreeMap<String, String>, labels: &BTreeMap<String, String>) -> bool {
    selector
        .iter()
        .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
}

#[async_trait]
impl PolicyClient for FakeControlPlane {
    async fn submit(&self, policy: &Policy) -> Result<SubmitAck> {
        let mut state = self.state.lock().unwrap();
        state.submits += 1;
        if let Some(err) = state.submit_errors.pop_front() {
            return Err(err);
        }

        let name = policy.name_any();
        let generation = match state.policies.get(&name) {
            Some(existing) if existing.spec == policy.spec => existing.generation(),
            Some(existing) => existing.generation().map(|g| g + 1),
            None => Some(1),
        };

        let mut stored = policy.clone();
        stored.metadata.generation = generation;
        state.policies.insert(name, stored);
        Ok(SubmitAck { generation })
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.deletes += 1;
        unavailable(&mut state.delete_errors, "delete")?;
        if !state.keep_deleted {
            state.policies.remove(name);
        }
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Policy>> {
        let mut state = self.state.lock().unwrap();
        unavailable(&mut state.get_errors, "get")?;
        Ok(state.policies.get(name).cloned())
    }
}

#[async_trait]
impl EnactmentReader for FakeControlPlane {
    async fn list_enactments(&self, policy_name: &str) -> Result<Vec<Enactment>> {
        let mut state = self.state.lock().unwrap();
        unavailable(&mut state.read_errors, "read")?;

        let Some(policy) = state.policies.get(policy_name).cloned() else {
            return Ok(vec![]);
        };

        let poll = *state
            .polls_per_policy
            .entry(policy_name.to_string())
            .and_modify(|p| *p += 1)
            .or_insert(0);
        state.enactment_polls += 1;

        let enactments = state
            .nodes
            .iter()
            .filter(|(_, labels)| selector_matches(&policy.spec.node_selector, labels))
            .filter_map(|(node, _)| {
                let script = state.scripts.get(node)?;
                let phase = *script.get(poll).or(script.last())?;
                Some(Enactment {
                    node_name: node.clone(),
                    policy_name: policy_name.to_string(),
                    phase,
                    last_transition_time: None,
                    message: Some(format!("{} is {}", node, phase)),
                    policy_generation: policy.generation(),
                })
            })
            .collect();

        Ok(enactments)
    }

    async fn selected_nodes(
        &self,
        selector: &BTreeMap<String, String>,
    ) -> Result<BTreeSet<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .nodes
            .iter()
            .filter(|(_, labels)| selector_matches(selector, labels))
            .map(|(node, _)| node.clone())
            .collect())
    }
}
