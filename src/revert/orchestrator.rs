// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Revert-and-confirm state machine.
//!
//! For each target policy an empty-state cleanup policy is submitted, the
//! run waits until every selected node reports it Available, and only then
//! is the cleanup policy deleted. Target policies are independent objects and
//! are reverted concurrently.

use crate::config::{cleanup_policy_name_for, Config};
use crate::constants::retry::DELETE_VERIFY_ATTEMPTS;
use crate::error::ClientError;
use crate::retry::{retry_transient, RetryPolicy};
use crate::revert::client::ControlPlane;
use crate::revert::poller::{ConvergenceResult, StatusPoller};
use crate::types::{Outcome, Policy, RunReport, TaskOutcome};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, instrument, warn};

/// The work item for one run
#[derive(Debug, Clone)]
pub struct RevertRequest {
    pub target_policy_names: Vec<String>,
    pub cleanup_policy_name: String,
    /// Used when a target policy no longer exists
    pub fallback_node_selector: BTreeMap<String, String>,
    pub desired_state: serde_json::Value,
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Hard limit for the whole run, measured from its start
    pub deadline: Option<Duration>,
}

impl RevertRequest {
    /// Name of the temporary policy for a target. With several targets each
    /// gets its own cleanup policy so they can be reverted concurrently.
    pub fn cleanup_policy_for(&self, target: &str) -> String {
        cleanup_policy_name_for(&self.cleanup_policy_name, &self.target_policy_names, target)
    }
}

impl From<&Config> for RevertRequest {
    fn from(config: &Config) -> Self {
        Self {
            target_policy_names: config.target_policies.clone(),
            cleanup_policy_name: config.cleanup_policy_name.clone(),
            fallback_node_selector: config.node_selector.clone(),
            desired_state: config.desired_state.clone(),
            timeout: config.timeout,
            poll_interval: config.poll_interval,
            deadline: config.deadline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertState {
    Init,
    Submitting,
    AwaitingConvergence,
    Deleting,
    VerifyingDeletion,
    Done(Outcome),
}

impl fmt::Display for RevertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevertState::Init => write!(f, "Init"),
            RevertState::Submitting => write!(f, "Submitting"),
            RevertState::AwaitingConvergence => write!(f, "AwaitingConvergence"),
            RevertState::Deleting => write!(f, "Deleting"),
            RevertState::VerifyingDeletion => write!(f, "VerifyingDeletion"),
            RevertState::Done(outcome) => write!(f, "Done({})", outcome),
        }
    }
}

/// Per-target progress carried between states
struct RevertTask<'a> {
    request: &'a RevertRequest,
    target: &'a str,
    cleanup: Policy,
    generation: Option<i64>,
    deadline: Option<Instant>,
    retry: RetryPolicy,
}

impl RevertTask<'_> {
    fn cleanup_name(&self) -> &str {
        self.cleanup.metadata.name.as_deref().unwrap_or_default()
    }
}

fn failed(context: &str, err: ClientError) -> RevertState {
    RevertState::Done(Outcome::Failed(format!("{}: {}", context, err)))
}

pub struct RevertOrchestrator<C: ?Sized> {
    client: Arc<C>,
    retry: RetryPolicy,
}

impl<C: ControlPlane + ?Sized> RevertOrchestrator<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    /// Revert every target policy and collect the outcomes in request order
    pub async fn run(&self, request: &RevertRequest) -> RunReport {
        // A deadline too far out to represent is treated as none
        let deadline = request
            .deadline
            .and_then(|d| Instant::now().checked_add(d));

        let tasks = request.target_policy_names.iter().map(|target| async move {
            TaskOutcome {
                name: target.clone(),
                outcome: self.revert_policy(request, target, deadline).await,
            }
        });

        RunReport {
            tasks: join_all(tasks).await,
        }
    }

    #[instrument(skip(self, request, deadline))]
    async fn revert_policy(
        &self,
        request: &RevertRequest,
        target: &str,
        deadline: Option<Instant>,
    ) -> Outcome {
        let cleanup = Policy::revert(
            &request.cleanup_policy_for(target),
            BTreeMap::new(),
            request.desired_state.clone(),
        );
        let mut task = RevertTask {
            request,
            target,
            cleanup,
            generation: None,
            deadline,
            retry: self.retry.clone().with_deadline(deadline),
        };

        let mut state = RevertState::Init;
        loop {
            let next = match state {
                RevertState::Init => self.init(&mut task).await,
                RevertState::Submitting => self.submit(&mut task).await,
                RevertState::AwaitingConvergence => self.await_convergence(&task).await,
                RevertState::Deleting => self.delete(&task).await,
                RevertState::VerifyingDeletion => self.verify_deletion(&task).await,
                RevertState::Done(outcome) => return outcome,
            };
            info!(from = %state, to = %next, "Revert state transition");
            state = next;
        }
    }

    /// Resolve the node selector from the target policy, falling back to configuration
    async fn init(&self, task: &mut RevertTask<'_>) -> RevertState {
        let client = &*self.client;
        let target = task.target;

        match retry_transient(&task.retry, "get", move || client.get(target)).await {
            Ok(Some(policy)) => {
                info!(
                    "Target policy {} still present, reusing its node selector",
                    policy.describe()
                );
                task.cleanup.spec.node_selector = policy.spec.node_selector;
            }
            Ok(None) => {
                info!(
                    "Target policy {} is gone, using configured node selector {:?}",
                    target, task.request.fallback_node_selector
                );
                task.cleanup.spec.node_selector = task.request.fallback_node_selector.clone();
            }
            Err(e) => return failed(&format!("reading target policy {}", target), e),
        }

        if !task.cleanup.is_dns_revert() {
            info!("Cleanup policy {} carries a custom desired state", task.cleanup_name());
        }
        RevertState::Submitting
    }

    async fn submit(&self, task: &mut RevertTask<'_>) -> RevertState {
        let client = &*self.client;
        let cleanup = &task.cleanup;

        match retry_transient(&task.retry, "submit", move || client.submit(cleanup)).await {
            Ok(ack) => {
                info!(
                    generation = ?ack.generation,
                    "Submitted cleanup policy {}",
                    cleanup.describe()
                );
                task.generation = ack.generation;
                RevertState::AwaitingConvergence
            }
            Err(e) => failed(
                &format!("submitting cleanup policy {}", task.cleanup_name()),
                e,
            ),
        }
    }

    async fn await_convergence(&self, task: &RevertTask<'_>) -> RevertState {
        let client = &*self.client;
        let selector = &task.cleanup.spec.node_selector;

        let expected = match retry_transient(&task.retry, "selected_nodes", move || {
            client.selected_nodes(selector)
        })
        .await
        {
            Ok(nodes) => nodes,
            Err(e) => return failed("listing selected nodes", e),
        };

        let poller = StatusPoller::new(self.client.clone(), task.retry.clone())
            .with_deadline(task.deadline);
        let result = poller
            .wait_for_convergence(
                task.cleanup_name(),
                task.generation,
                &expected,
                task.request.timeout,
                task.request.poll_interval,
            )
            .await;

        match result {
            Ok(ConvergenceResult::Converged) => RevertState::Deleting,
            Ok(ConvergenceResult::Diverged { node, message }) => {
                warn!(
                    "Leaving cleanup policy {} in place for inspection",
                    task.cleanup_name()
                );
                RevertState::Done(Outcome::Failed(format!(
                    "node {} failed to enact {}: {}",
                    node,
                    task.cleanup_name(),
                    message
                )))
            }
            Ok(ConvergenceResult::TimedOut(remaining)) => {
                warn!(
                    "Leaving cleanup policy {} in place for inspection",
                    task.cleanup_name()
                );
                RevertState::Done(Outcome::TimedOut(remaining))
            }
            Err(e) => failed("reading enactments", e),
        }
    }

    async fn delete(&self, task: &RevertTask<'_>) -> RevertState {
        match self.delete_cleanup(task).await {
            Ok(()) => RevertState::VerifyingDeletion,
            Err(e) => failed(
                &format!("deleting cleanup policy {}", task.cleanup_name()),
                e,
            ),
        }
    }

    async fn delete_cleanup(&self, task: &RevertTask<'_>) -> crate::error::Result<()> {
        let client = &*self.client;
        let name = task.cleanup_name();
        retry_transient(&task.retry, "delete", move || client.delete(name)).await
    }

    /// Deletion of the temporary policy is best effort once convergence is confirmed
    async fn verify_deletion(&self, task: &RevertTask<'_>) -> RevertState {
        let client = &*self.client;
        let name = task.cleanup_name();

        for attempt in 1..=DELETE_VERIFY_ATTEMPTS {
            match retry_transient(&task.retry, "get", move || client.get(name)).await {
                Ok(None) => {
                    info!("Cleanup policy {} is gone", name);
                    return RevertState::Done(Outcome::Succeeded);
                }
                Ok(Some(_)) if attempt < DELETE_VERIFY_ATTEMPTS => {
                    let delay = match task.retry.remaining() {
                        Some(left) if left.is_zero() => break,
                        Some(left) => task.retry.backoff(attempt).min(left),
                        None => task.retry.backoff(attempt),
                    };
                    info!(
                        attempt,
                        "Cleanup policy {} still present, deleting again in {:?}", name, delay
                    );
                    sleep(delay).await;
                    if let Err(e) = self.delete_cleanup(task).await {
                        warn!("Repeated delete of {} failed: {}", name, e);
                    }
                }
                Ok(Some(_)) => {}
                Err(e) => return failed(&format!("verifying deletion of {}", name), e),
            }
        }

        warn!(
            "Cleanup policy {} still present after deletion; configuration was reverted, leaving it for garbage collection",
            name
        );
        RevertState::Done(Outcome::Succeeded)
    }
}
