// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Maps run outcomes to the process exit contract.

use crate::constants::exit_codes;
use crate::types::{Outcome, RunReport};
use tracing::{error, info, warn};

pub fn exit_code(outcome: &Outcome) -> u8 {
    match outcome {
        Outcome::Succeeded => exit_codes::SUCCEEDED,
        Outcome::Failed(_) => exit_codes::FAILED,
        Outcome::TimedOut(_) => exit_codes::TIMED_OUT,
    }
}

/// Log the outcome of a run and return the exit code for the job runner
pub fn report(operation: &str, report: &RunReport) -> u8 {
    for task in &report.tasks {
        info!(operation, task = %task.name, outcome = %task.outcome, "Task finished");
    }

    let outcome = report.aggregate();
    match &outcome {
        Outcome::Succeeded => {
            info!(operation, tasks = report.tasks.len(), "Run succeeded");
        }
        Outcome::TimedOut(nodes) => {
            error!(
                operation,
                outcome = "TimedOut",
                unconverged_nodes = ?nodes,
                "Run timed out before all nodes converged"
            );
        }
        Outcome::Failed(reason) => {
            error!(operation, outcome = "Failed", reason = %reason, "Run failed");
        }
    }

    for extra in report.supplementary() {
        warn!(operation, task = %extra.name, outcome = %extra.outcome, "Additional task did not succeed");
    }

    exit_code(&outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskOutcome;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&Outcome::Succeeded), 0);
        assert_eq!(exit_code(&Outcome::Failed("rejected".to_string())), 1);
        assert_eq!(exit_code(&Outcome::TimedOut(vec!["node-a".to_string()])), 2);
    }

    #[test]
    fn test_report_uses_aggregate_outcome() {
        let report = RunReport {
            tasks: vec![
                TaskOutcome {
                    name: "dns-a".to_string(),
                    outcome: Outcome::Succeeded,
                },
                TaskOutcome {
                    name: "dns-b".to_string(),
                    outcome: Outcome::Failed("node node-b failed".to_string()),
                },
            ],
        };

        assert_eq!(super::report("revert", &report), 1);
    }

    #[test]
    fn test_report_success() {
        assert_eq!(super::report("revert", &RunReport::single("dns-a", Outcome::Succeeded)), 0);
    }
}
