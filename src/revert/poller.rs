// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Condition-based waiting for a policy to be enacted on every expected node.

use crate::error::Result;
use crate::retry::{retry_transient, RetryPolicy};
use crate::revert::client::EnactmentReader;
use crate::types::{Enactment, Phase};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvergenceResult {
    /// Every expected node reports Available
    Converged,
    /// A node reported Failed or Aborted
    Diverged { node: String, message: String },
    /// The deadline passed; lists the nodes that had not converged
    TimedOut(Vec<String>),
}

/// Snapshot evaluation of one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Assessment {
    Converged,
    Diverged { node: String, message: String },
    Waiting(Vec<String>),
}

/// Evaluate enactments against the expected node set. Enactments for other
/// nodes and enactments describing an older policy generation are ignored.
pub(crate) fn assess(
    expected: &BTreeSet<String>,
    enactments: &[Enactment],
    generation: Option<i64>,
) -> Assessment {
    let by_node: HashMap<&str, &Enactment> = enactments
        .iter()
        .filter(|e| expected.contains(&e.node_name) && !e.is_stale(generation))
        .map(|e| (e.node_name.as_str(), e))
        .collect();

    if let Some(failed) = expected
        .iter()
        .filter_map(|node| by_node.get(node.as_str()))
        .find(|e| e.phase.is_failure())
    {
        return Assessment::Diverged {
            node: failed.node_name.clone(),
            message: failed
                .message
                .clone()
                .unwrap_or_else(|| failed.phase.to_string()),
        };
    }

    let remaining: Vec<String> = expected
        .iter()
        .filter(|node| {
            by_node
                .get(node.as_str())
                .map_or(true, |e| e.phase != Phase::Available)
        })
        .cloned()
        .collect();

    if remaining.is_empty() {
        Assessment::Converged
    } else {
        Assessment::Waiting(remaining)
    }
}

pub struct StatusPoller<C: ?Sized> {
    reader: Arc<C>,
    retry: RetryPolicy,
    deadline: Option<Instant>,
}

impl<C: EnactmentReader + ?Sized> StatusPoller<C> {
    pub fn new(reader: Arc<C>, retry: RetryPolicy) -> Self {
        Self {
            reader,
            retry,
            deadline: None,
        }
    }

    /// Bound every wait by an external deadline in addition to its own timeout
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Poll enactments of `policy_name` until every node in `expected` is
    /// Available, any of them fails, or the timeout passes.
    #[instrument(skip(self, expected), fields(nodes = expected.len()))]
    pub async fn wait_for_convergence(
        &self,
        policy_name: &str,
        generation: Option<i64>,
        expected: &BTreeSet<String>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<ConvergenceResult> {
        if expected.is_empty() {
            info!("No nodes selected, nothing to wait for");
            return Ok(ConvergenceResult::Converged);
        }

        // A timeout too large to represent is no timeout at all
        let deadline = [Instant::now().checked_add(timeout), self.deadline]
            .into_iter()
            .flatten()
            .min();
        let retry = self.retry.clone().with_deadline(deadline);
        let reader = &*self.reader;
        let mut polls = 0u32;
        let mut remaining: Vec<String> = expected.iter().cloned().collect();

        loop {
            polls += 1;
            let read = retry_transient(&retry, "list_enactments", move || {
                reader.list_enactments(policy_name)
            })
            .await;
            let enactments = match read {
                Ok(enactments) => enactments,
                Err(e) if e.is_transient() && deadline.is_some_and(|d| Instant::now() >= d) => {
                    warn!(polls, ?remaining, "Timed out while enactments were unreadable: {}", e);
                    return Ok(ConvergenceResult::TimedOut(remaining));
                }
                Err(e) => return Err(e),
            };

            match assess(expected, &enactments, generation) {
                Assessment::Converged => {
                    info!(polls, "All selected nodes report Available");
                    return Ok(ConvergenceResult::Converged);
                }
                Assessment::Diverged { node, message } => {
                    warn!(polls, node = %node, "Node failed to enact policy: {}", message);
                    return Ok(ConvergenceResult::Diverged { node, message });
                }
                Assessment::Waiting(waiting) => {
                    remaining = waiting;
                    let now = Instant::now();
                    if deadline.is_some_and(|d| now >= d) {
                        warn!(polls, ?remaining, "Timed out waiting for convergence");
                        return Ok(ConvergenceResult::TimedOut(remaining));
                    }
                    debug!(polls, ?remaining, "Waiting for nodes to converge");
                    let pause = deadline.map_or(poll_interval, |d| poll_interval.min(d - now));
                    sleep(pause).await;
                }
            }
        }
    }
}
