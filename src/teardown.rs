// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Operator removal, invoked separately from the policy revert.
//!
//! Order matters: the subscription goes first so OLM does not reinstall the
//! ClusterServiceVersion, and the namespace goes last.

use crate::config::OperatorConfig;
use crate::error::Result;
use crate::kubernetes::olm::{delete_csv, delete_subscription, installed_csv};
use crate::kubernetes::{delete_crd, delete_namespace};
use crate::retry::{retry_transient, RetryPolicy};
use crate::types::{Outcome, RunReport, TaskOutcome};
use kube::Client;
use tracing::{info, instrument, warn};

pub struct OperatorTeardown {
    client: Client,
    config: OperatorConfig,
    retry: RetryPolicy,
}

impl OperatorTeardown {
    pub fn new(client: Client, config: OperatorConfig) -> Self {
        Self {
            client,
            config,
            retry: RetryPolicy::default(),
        }
    }

    /// Remove the subscription, its installed CSV, the CRDs and the namespace.
    /// Stops at the first permanent failure; later steps are not attempted.
    #[instrument(skip(self), fields(namespace = %self.config.namespace))]
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();

        let steps = self.plan().await;
        let steps = match steps {
            Ok(steps) => steps,
            Err(e) => {
                return RunReport::single(
                    "subscription",
                    Outcome::Failed(format!("reading subscription: {}", e)),
                )
            }
        };

        for step in steps {
            let name = step.to_string();
            let outcome = match self.execute(&step).await {
                Ok(_) => Outcome::Succeeded,
                Err(e) => Outcome::Failed(format!("deleting {}: {}", name, e)),
            };
            let stop = !outcome.is_success();
            report.tasks.push(TaskOutcome { name, outcome });
            if stop {
                warn!("Stopping operator teardown after failed step");
                break;
            }
        }

        report
    }

    async fn plan(&self) -> Result<Vec<Step>> {
        let client = &self.client;
        let namespace = self.config.namespace.as_str();
        let subscription = self.config.subscription.as_str();

        let csv = retry_transient(&self.retry, "installed_csv", move || {
            installed_csv(client, namespace, subscription)
        })
        .await?;

        let mut steps = vec![Step::Subscription(subscription.to_string())];
        match csv {
            Some(csv) => steps.push(Step::Csv(csv)),
            None => info!("No installed ClusterServiceVersion recorded for {}", subscription),
        }
        steps.extend(self.config.crds.iter().cloned().map(Step::Crd));
        steps.push(Step::Namespace(namespace.to_string()));
        Ok(steps)
    }

    async fn execute(&self, step: &Step) -> Result<bool> {
        let client = &self.client;
        let namespace = self.config.namespace.as_str();

        match step {
            Step::Subscription(name) => {
                retry_transient(&self.retry, "delete_subscription", move || {
                    delete_subscription(client, namespace, name)
                })
                .await
            }
            Step::Csv(name) => {
                retry_transient(&self.retry, "delete_csv", move || {
                    delete_csv(client, namespace, name)
                })
                .await
            }
            Step::Crd(name) => {
                retry_transient(&self.retry, "delete_crd", move || delete_crd(client, name)).await
            }
            Step::Namespace(name) => {
                retry_transient(&self.retry, "delete_namespace", move || {
                    delete_namespace(client, name)
                })
                .await
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Subscription(String),
    Csv(String),
    Crd(String),
    Namespace(String),
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Subscription(name) => write!(f, "subscription/{}", name),
            Step::Csv(name) => write!(f, "clusterserviceversion/{}", name),
            Step::Crd(name) => write!(f, "customresourcedefinition/{}", name),
            Step::Namespace(name) => write!(f, "namespace/{}", name),
        }
    }
}
