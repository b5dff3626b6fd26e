// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use clap::{Parser, Subcommand};
use kube::Client;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nmstate_revert::config::{Config, OperatorConfig};
use nmstate_revert::kubernetes::{policy_api_served, KubePolicyClient};
use nmstate_revert::retry::{retry_transient, RetryPolicy};
use nmstate_revert::revert::reporter;
use nmstate_revert::revert::{RevertOrchestrator, RevertRequest};
use nmstate_revert::teardown::OperatorTeardown;
use nmstate_revert::types::{Outcome, RunReport};

/// Revert an nmstate network policy and confirm every node has let go of it
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Revert the target policies (default)
    Revert,
    /// Remove the nmstate operator: subscription, CSV, CRDs and namespace
    UninstallOperator,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = match cli.command.unwrap_or(Command::Revert) {
        Command::Revert => revert().await?,
        Command::UninstallOperator => uninstall_operator().await?,
    };
    Ok(ExitCode::from(code))
}

async fn revert() -> Result<u8> {
    let config = Config::from_env()?;
    info!(
        targets = ?config.target_policies,
        cleanup_policy = %config.cleanup_policy_name,
        timeout = ?config.timeout,
        "Configuration loaded"
    );

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let preflight = {
        let client = &client;
        retry_transient(&RetryPolicy::default(), "discovery", move || {
            policy_api_served(client)
        })
        .await
    };
    let failure = match preflight {
        Ok(true) => None,
        Ok(false) => Some("policy API not served".to_string()),
        Err(e) => Some(format!("discovering policy API: {}", e)),
    };
    if let Some(reason) = failure {
        warn!("Preflight failed, nothing was submitted");
        let report = RunReport::single("preflight", Outcome::Failed(reason));
        return Ok(reporter::report("revert", &report));
    }

    let orchestrator = RevertOrchestrator::new(Arc::new(KubePolicyClient::new(client)));
    let report = orchestrator.run(&RevertRequest::from(&config)).await;
    Ok(reporter::report("revert", &report))
}

async fn uninstall_operator() -> Result<u8> {
    let config = OperatorConfig::from_env()?;
    info!(
        namespace = %config.namespace,
        subscription = %config.subscription,
        "Operator removal configuration loaded"
    );

    let client = Client::try_default().await?;
    let report = OperatorTeardown::new(client, config).run().await;
    Ok(reporter::report("uninstall-operator", &report))
}
