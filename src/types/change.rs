//! The unit of change an invocation operates on.

use serde::{Deserialize, Serialize};

use super::ids::IssueNumber;

/// Whether the change unit is a pull request or a plain issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    PullRequest,
    Issue,
}

/// A single pull request (or issue) plus the paths it changes.
///
/// Issues never carry changed files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeUnit {
    pub number: IssueNumber,
    pub kind: ChangeKind,
    /// Repository-relative paths, in the order the API reported them.
    pub changed_files: Vec<String>,
}

impl ChangeUnit {
    pub fn pull_request(number: IssueNumber, changed_files: Vec<String>) -> Self {
        ChangeUnit {
            number,
            kind: ChangeKind::PullRequest,
            changed_files,
        }
    }

    pub fn is_pull_request(&self) -> bool {
        self.kind == ChangeKind::PullRequest
    }
}
