//! Merge readiness evaluation.
//!
//! Readiness is recomputed from fresh pull request and check-run data every
//! time it is needed; nothing here is cached.

use std::collections::BTreeSet;
use std::fmt;

use crate::effects::{CheckRunData, PullRequestData};

/// Label-side readiness of a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelReadiness {
    /// Required labels not applied, in configured order.
    pub missing: Vec<String>,
    pub already_merged: bool,
    /// False when GitHub reports conflicts or has not computed mergeability.
    pub mergeable: bool,
}

impl LabelReadiness {
    pub fn is_ready(&self) -> bool {
        self.missing.is_empty() && !self.already_merged && self.mergeable
    }
}

/// Compares the applied labels against `required`.
pub fn labels_ready(required: &[String], pr: &PullRequestData) -> LabelReadiness {
    let present: BTreeSet<&str> = pr.labels.iter().map(String::as_str).collect();
    let mut seen = BTreeSet::new();
    let missing = required
        .iter()
        .filter(|label| !present.contains(label.as_str()))
        .filter(|label| seen.insert(label.as_str()))
        .cloned()
        .collect();

    LabelReadiness {
        missing,
        already_merged: pr.merged,
        mergeable: pr.mergeable == Some(true),
    }
}

/// Check-run side readiness of a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksReadiness {
    /// A run had not completed. Runs after it were not inspected.
    Pending { name: String },

    /// Every run completed, but these did not succeed.
    Failing { names: Vec<String> },

    /// Every run completed successfully (or there were none).
    Passed,
}

impl ChecksReadiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, ChecksReadiness::Passed)
    }
}

/// Evaluates check runs in order, stopping at the first incomplete one.
pub fn checks_ready<'a>(runs: impl IntoIterator<Item = &'a CheckRunData>) -> ChecksReadiness {
    let mut failing = Vec::new();
    for run in runs {
        if !run.is_completed() {
            return ChecksReadiness::Pending {
                name: run.name.clone(),
            };
        }
        if !run.is_success() {
            failing.push(run.name.clone());
        }
    }

    if failing.is_empty() {
        ChecksReadiness::Passed
    } else {
        ChecksReadiness::Failing { names: failing }
    }
}

/// Both halves of a readiness evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    pub labels: LabelReadiness,
    pub checks: ChecksReadiness,
}

impl Readiness {
    pub fn evaluate(required: &[String], pr: &PullRequestData, runs: &[CheckRunData]) -> Self {
        Readiness {
            labels: labels_ready(required, pr),
            checks: checks_ready(runs),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.labels.is_ready() && self.checks.is_ready()
    }

    pub fn state(&self) -> MergeState {
        if self.labels.already_merged {
            return MergeState::Merged;
        }
        match (self.labels.is_ready(), self.checks.is_ready()) {
            (true, true) => MergeState::Ready,
            (true, false) => MergeState::LabelsOnly,
            (false, true) => MergeState::ChecksOnly,
            (false, false) => MergeState::Pending,
        }
    }
}

/// Where a pull request stands on its way to being merged.
///
/// `Merged` and `Blocked` are terminal. `Blocked` is reached when an
/// evaluation or merge fails with an error rather than a negative answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeState {
    Pending,
    LabelsOnly,
    ChecksOnly,
    Ready,
    Merged,
    Blocked,
}

impl fmt::Display for MergeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MergeState::Pending => "pending",
            MergeState::LabelsOnly => "labels-only",
            MergeState::ChecksOnly => "checks-only",
            MergeState::Ready => "ready",
            MergeState::Merged => "merged",
            MergeState::Blocked => "blocked",
        };
        f.write_str(s)
    }
}
