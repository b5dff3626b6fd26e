// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::defaults;
use crate::types::policy::empty_dns_state;
use anyhow::{bail, Context, Result};
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::time::Duration;

/// Revert configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Policies whose effect must be reverted
    pub target_policies: Vec<String>,
    /// Namespace the operator is installed in
    pub namespace: String,
    /// Name of the temporary empty-state policy
    pub cleanup_policy_name: String,
    /// Selector used when a target policy no longer exists
    pub node_selector: BTreeMap<String, String>,
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Hard deadline for the whole run, measured from start
    pub deadline: Option<Duration>,
    /// Document submitted as the cleanup policy's desired state
    pub desired_state: serde_json::Value,
}

/// Operator removal configuration, independent of the revert
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    pub namespace: String,
    pub subscription: String,
    pub crds: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut target_policies = split_list(
            &lookup("TARGET_POLICIES").context("TARGET_POLICIES environment variable not set")?,
        );
        let mut seen = HashSet::new();
        target_policies.retain(|name| seen.insert(name.clone()));
        if target_policies.is_empty() {
            bail!("TARGET_POLICIES must name at least one policy");
        }

        let namespace = lookup("NAMESPACE").unwrap_or_else(|| defaults::NAMESPACE.to_string());
        let cleanup_policy_name = lookup("CLEANUP_POLICY_NAME")
            .unwrap_or_else(|| defaults::CLEANUP_POLICY_NAME.to_string());
        for target in &target_policies {
            let cleanup = cleanup_policy_name_for(&cleanup_policy_name, &target_policies, target);
            if target_policies.contains(&cleanup) {
                bail!(
                    "cleanup policy for '{}' would be '{}', which is itself a target policy; set CLEANUP_POLICY_NAME",
                    target,
                    cleanup
                );
            }
        }

        let node_selector = match lookup("NODE_SELECTOR") {
            Some(raw) => parse_selector(&raw)?,
            None => BTreeMap::new(),
        };

        let timeout = secs(&lookup, "TIMEOUT_SECS")?.unwrap_or(defaults::TIMEOUT_SECS);
        let poll_interval =
            secs(&lookup, "POLL_INTERVAL_SECS")?.unwrap_or(defaults::POLL_INTERVAL_SECS);
        if poll_interval == 0 {
            bail!("POLL_INTERVAL_SECS must be greater than zero");
        }
        let deadline = secs(&lookup, "DEADLINE_SECS")?.map(Duration::from_secs);

        let desired_state = match lookup("REVERT_DESIRED_STATE") {
            Some(raw) => serde_yaml::from_str(&raw)
                .context("REVERT_DESIRED_STATE is not a valid YAML document")?,
            None => empty_dns_state(),
        };

        Ok(Config {
            target_policies,
            namespace,
            cleanup_policy_name,
            node_selector,
            timeout: Duration::from_secs(timeout),
            poll_interval: Duration::from_secs(poll_interval),
            deadline,
            desired_state,
        })
    }
}

impl OperatorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let namespace = lookup("NAMESPACE").unwrap_or_else(|| defaults::NAMESPACE.to_string());
        let subscription = lookup("OPERATOR_SUBSCRIPTION")
            .unwrap_or_else(|| defaults::OPERATOR_SUBSCRIPTION.to_string());
        let crds = match lookup("OPERATOR_CRDS") {
            Some(raw) => split_list(&raw),
            None => defaults::OPERATOR_CRDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        Ok(OperatorConfig {
            namespace,
            subscription,
            crds,
        })
    }
}

/// Name of the temporary policy for `target`. A single target uses `base`;
/// with several targets each gets `<base>-<target>`.
pub fn cleanup_policy_name_for(base: &str, targets: &[String], target: &str) -> String {
    if targets.len() == 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, target)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn secs<F>(lookup: &F, key: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .with_context(|| format!("{} must be a whole number of seconds, got '{}'", key, raw))
        })
        .transpose()
}

/// Parse `key=value,key2=value2` into a label map. A bare key selects an empty value.
pub fn parse_selector(raw: &str) -> Result<BTreeMap<String, String>> {
    let mut selector = BTreeMap::new();
    for pair in split_list(raw) {
        let (key, value) = pair.split_once('=').unwrap_or((pair.as_str(), ""));
        let key = key.trim();
        if key.is_empty() {
            bail!("invalid node selector entry '{}'", pair);
        }
        selector.insert(key.to_string(), value.trim().to_string());
    }
    Ok(selector)
}
