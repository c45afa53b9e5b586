//! Approval state derived from comment history.
//!
//! A comment line whose first whitespace-delimited token is exactly `/approve`
//! credits the comment author as an approver; `/lgtm` credits them as a
//! reviewer. Anything after the first token is ignored here, so
//! `/approve cancel` still counts as an approval in the ledger even though the
//! command handler removes the label.

use std::collections::BTreeSet;

use crate::effects::CommentData;

const APPROVE_TOKEN: &str = "/approve";
const LGTM_TOKEN: &str = "/lgtm";

/// Approvers and reviewers credited by comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalLedger {
    pub approvers: BTreeSet<String>,
    pub reviewers: BTreeSet<String>,
}

impl ApprovalLedger {
    /// Scans comment bodies line by line.
    pub fn scan<'a>(comments: impl IntoIterator<Item = &'a CommentData>) -> Self {
        let mut ledger = ApprovalLedger::default();
        for comment in comments {
            for line in comment.body.lines() {
                match line.split_whitespace().next() {
                    Some(APPROVE_TOKEN) => {
                        ledger.approvers.insert(comment.author.clone());
                    }
                    Some(LGTM_TOKEN) => {
                        ledger.reviewers.insert(comment.author.clone());
                    }
                    _ => {}
                }
            }
        }
        ledger
    }
}

/// The ledger plus the pull request author, as used for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalState {
    pub ledger: ApprovalLedger,
    pub author: String,
}

impl ApprovalState {
    pub fn new(ledger: ApprovalLedger, author: impl Into<String>) -> Self {
        ApprovalState {
            ledger,
            author: author.into(),
        }
    }

    /// Comment-derived approvers with the author credited implicitly.
    pub fn credited_approvers(&self) -> BTreeSet<String> {
        let mut approvers = self.ledger.approvers.clone();
        if !self.author.is_empty() {
            approvers.insert(self.author.clone());
        }
        approvers
    }
}
