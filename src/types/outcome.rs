// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::fmt;

/// Terminal result of reverting one policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    /// Convergence was not reached in time; lists the unconverged nodes
    TimedOut(Vec<String>),
    Failed(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Succeeded => write!(f, "succeeded"),
            Outcome::TimedOut(nodes) => {
                write!(f, "timed out waiting for nodes [{}]", nodes.join(", "))
            }
            Outcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Outcome of one unit of work within a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub name: String,
    pub outcome: Outcome,
}

/// All outcomes of a run, in configuration order
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub tasks: Vec<TaskOutcome>,
}

impl RunReport {
    pub fn single(name: &str, outcome: Outcome) -> Self {
        Self {
            tasks: vec![TaskOutcome {
                name: name.to_string(),
                outcome,
            }],
        }
    }

    /// Succeeded only if every task succeeded, otherwise the first non-success
    pub fn aggregate(&self) -> Outcome {
        self.tasks
            .iter()
            .find(|t| !t.outcome.is_success())
            .map(|t| t.outcome.clone())
            .unwrap_or(Outcome::Succeeded)
    }

    /// Non-successful tasks after the first one
    pub fn supplementary(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.tasks
            .iter()
            .filter(|t| !t.outcome.is_success())
            .skip(1)
    }
}
