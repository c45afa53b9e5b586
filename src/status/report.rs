//! Approval status of each changed file.

use std::collections::BTreeSet;

use crate::ledger::ApprovalState;
use crate::owners::{AliasTable, ChangedFilesOwners};

/// Approval status of a single changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    /// Repository-relative path.
    pub path: String,
    /// Approver names as listed in the manifests (aliases unexpanded).
    pub eligible: BTreeSet<String>,
    /// Credited approvers allowed to approve this file, sorted.
    pub approved_by: Vec<String>,
}

impl FileStatus {
    pub fn is_satisfied(&self) -> bool {
        !self.approved_by.is_empty()
    }
}

/// Everything the status comment shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Approvers credited from comments plus the author.
    pub credited: BTreeSet<String>,
    pub files: Vec<FileStatus>,
}

impl StatusReport {
    /// Matches credited approvers against each file's required approvers.
    pub fn build(owners: &ChangedFilesOwners, state: &ApprovalState, aliases: &AliasTable) -> Self {
        let credited = state.credited_approvers();
        let files = owners
            .files
            .iter()
            .map(|file| FileStatus {
                path: file.path.clone(),
                eligible: file.owners.approvers.clone(),
                approved_by: file.owners.who_can_approve(&credited, aliases),
            })
            .collect();
        StatusReport { credited, files }
    }

    /// True when every changed file has an eligible approver.
    pub fn is_approved(&self) -> bool {
        self.files.iter().all(FileStatus::is_satisfied)
    }

    pub fn unsatisfied(&self) -> impl Iterator<Item = &FileStatus> {
        self.files.iter().filter(|f| !f.is_satisfied())
    }
}
