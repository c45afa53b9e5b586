//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! An interpreter executes them against the real API (or a mock in tests).

use serde::{Deserialize, Serialize};

use crate::types::{CommentId, IssueNumber, Sha};

/// A GitHub API effect.
///
/// Each variant describes one GitHub API operation. Effects are repo-scoped:
/// the interpreter is constructed with a `RepoId`, so effects don't include it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── Queries ──────────────────────────────────────────────────────────────
    /// Fetch a single pull request by number.
    GetPullRequest { number: IssueNumber },

    /// Fetch a single issue by number.
    GetIssue { number: IssueNumber },

    /// Fetch a single comment by ID.
    GetComment { comment_id: CommentId },

    /// List all comments on an issue or pull request.
    ListComments { number: IssueNumber },

    /// List the paths changed by a pull request.
    ListChangedFiles { number: IssueNumber },

    /// List the labels defined in the repository.
    ListRepoLabels,

    /// List the check runs reported against a commit.
    ListCheckRuns { sha: Sha },

    /// Fetch the account the client is authenticated as.
    GetAuthenticatedUser,

    // ─── Mutations ────────────────────────────────────────────────────────────
    /// Post a new comment.
    CreateComment { number: IssueNumber, body: String },

    /// Delete an existing comment.
    DeleteComment { comment_id: CommentId },

    /// Apply a label to an issue or pull request.
    AddLabel { number: IssueNumber, label: String },

    /// Remove a label from an issue or pull request.
    RemoveLabel { number: IssueNumber, label: String },

    /// Merge a pull request.
    MergePullRequest {
        number: IssueNumber,
        commit_title: String,
        commit_message: String,
    },
}

impl GitHubEffect {
    /// Short operation name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubEffect::GetPullRequest { .. } => "get_pull_request",
            GitHubEffect::GetIssue { .. } => "get_issue",
            GitHubEffect::GetComment { .. } => "get_comment",
            GitHubEffect::ListComments { .. } => "list_comments",
            GitHubEffect::ListChangedFiles { .. } => "list_changed_files",
            GitHubEffect::ListRepoLabels => "list_repo_labels",
            GitHubEffect::ListCheckRuns { .. } => "list_check_runs",
            GitHubEffect::GetAuthenticatedUser => "get_authenticated_user",
            GitHubEffect::CreateComment { .. } => "create_comment",
            GitHubEffect::DeleteComment { .. } => "delete_comment",
            GitHubEffect::AddLabel { .. } => "add_label",
            GitHubEffect::RemoveLabel { .. } => "remove_label",
            GitHubEffect::MergePullRequest { .. } => "merge_pull_request",
        }
    }
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// Pull request data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestData {
    pub number: IssueNumber,
    pub title: String,
    /// Login of the pull request author.
    pub author: String,
    pub head_sha: Sha,
    /// Names of the labels currently applied.
    pub labels: Vec<String>,
    pub merged: bool,
    /// GitHub's mergeability verdict. `None` while GitHub is still computing it.
    pub mergeable: Option<bool>,
}

/// Issue data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueData {
    pub number: IssueNumber,
    pub title: String,
    pub author: String,
    pub labels: Vec<String>,
    /// True when the issue is actually a pull request.
    pub is_pull_request: bool,
}

/// Comment data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentData {
    pub id: CommentId,
    /// Login of the comment author.
    pub author: String,
    pub body: String,
}

/// A CI check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunData {
    pub name: String,
    /// `queued`, `in_progress`, `completed`, ...
    pub status: String,
    /// Only meaningful once `status` is `completed`.
    pub conclusion: Option<String>,
}

impl CheckRunData {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }

    pub fn is_success(&self) -> bool {
        self.conclusion.as_deref() == Some("success")
    }
}

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `GetPullRequest`.
    PullRequest(PullRequestData),

    /// Response to `GetIssue`.
    Issue(IssueData),

    /// Response to `GetComment`.
    Comment(CommentData),

    /// Response to `ListComments`.
    Comments(Vec<CommentData>),

    /// Response to `ListChangedFiles`.
    ChangedFiles(Vec<String>),

    /// Response to `ListRepoLabels`.
    Labels(Vec<String>),

    /// Response to `ListCheckRuns`.
    CheckRuns(Vec<CheckRunData>),

    /// Response to `GetAuthenticatedUser`.
    User { login: String },

    /// Response to `CreateComment`.
    CommentCreated { id: CommentId },

    /// Response to `DeleteComment`.
    CommentDeleted,

    /// Response to `AddLabel`.
    LabelAdded,

    /// Response to `RemoveLabel`.
    LabelRemoved,

    /// Response to `MergePullRequest`.
    Merged { sha: Sha },
}

impl GitHubResponse {
    /// Short variant name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubResponse::PullRequest(_) => "pull_request",
            GitHubResponse::Issue(_) => "issue",
            GitHubResponse::Comment(_) => "comment",
            GitHubResponse::Comments(_) => "comments",
            GitHubResponse::ChangedFiles(_) => "changed_files",
            GitHubResponse::Labels(_) => "labels",
            GitHubResponse::CheckRuns(_) => "check_runs",
            GitHubResponse::User { .. } => "user",
            GitHubResponse::CommentCreated { .. } => "comment_created",
            GitHubResponse::CommentDeleted => "comment_deleted",
            GitHubResponse::LabelAdded => "label_added",
            GitHubResponse::LabelRemoved => "label_removed",
            GitHubResponse::Merged { .. } => "merged",
        }
    }
}
