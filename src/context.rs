//! The invocation context.
//!
//! Everything the broker needs to know about the triggering event is collected
//! once, validated, and then passed around as an immutable [`Invocation`].
//! Command-line flags take precedence over the environment variables the CI
//! workflow sets.

use std::fmt;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use thiserror::Error;

use crate::types::{ChangeKind, CommentId, InvalidRepoId, IssueNumber, RepoId};

/// The kind of event that triggered this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum EventKind {
    /// A pull request was opened.
    NewPr,
    /// A comment was posted on an issue or pull request.
    Comment,
    /// Merge readiness should be evaluated.
    CheckMerge,
    /// CI finished; announce it so readiness is re-evaluated.
    TestsDone,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::NewPr => "new-pr",
            EventKind::Comment => "comment",
            EventKind::CheckMerge => "check-merge",
            EventKind::TestsDone => "tests-done",
        };
        f.write_str(s)
    }
}

/// Invalid or incomplete invocation context.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error(transparent)]
    Repo(#[from] InvalidRepoId),

    #[error("{event} events need a pull request number")]
    MissingPullRequest { event: EventKind },

    #[error("comment events need an issue or pull request number")]
    MissingTarget,

    #[error("comment events need a comment id")]
    MissingComment,

    #[error("{field} must be a positive number")]
    Zero { field: &'static str },

    #[error("no API token given")]
    MissingToken,
}

/// Raw context as read from flags and environment.
#[derive(Debug, Clone, Args)]
pub struct InvocationArgs {
    /// Triggering event.
    #[arg(long, env = "OWNERS_GATE_EVENT", value_enum)]
    pub event: EventKind,

    /// Target repository as `owner/name`.
    #[arg(long, env = "OWNERS_GATE_REPO")]
    pub repo: String,

    /// Pull request number.
    #[arg(long, env = "OWNERS_GATE_PR")]
    pub pr: Option<u64>,

    /// Issue number, for comments on plain issues.
    #[arg(long, env = "OWNERS_GATE_ISSUE")]
    pub issue: Option<u64>,

    /// ID of the triggering comment.
    #[arg(long, env = "OWNERS_GATE_COMMENT")]
    pub comment: Option<u64>,

    /// API token. Falls back to `GITHUB_TOKEN`.
    #[arg(long, env = "OWNERS_GATE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Checked-out repository. Falls back to `GITHUB_WORKSPACE`, then `.`.
    #[arg(long, env = "OWNERS_GATE_WORKSPACE")]
    pub workspace: Option<PathBuf>,
}

impl InvocationArgs {
    /// Validates the raw context.
    ///
    /// `fallback_env` resolves the secondary environment variables
    /// (`GITHUB_TOKEN`, `GITHUB_WORKSPACE`); it is a parameter so tests do not
    /// depend on the process environment.
    pub fn into_invocation(
        self,
        fallback_env: impl Fn(&str) -> Option<String>,
    ) -> Result<Invocation, ContextError> {
        let repo = RepoId::parse(&self.repo)?;
        let pr = positive(self.pr, "pull request number")?.map(IssueNumber);
        let issue = positive(self.issue, "issue number")?.map(IssueNumber);
        let comment = positive(self.comment, "comment id")?.map(CommentId);

        let target = match (self.event, pr, issue) {
            (_, Some(pr), _) => Target {
                number: pr,
                kind: ChangeKind::PullRequest,
            },
            (EventKind::Comment, None, Some(issue)) => Target {
                number: issue,
                kind: ChangeKind::Issue,
            },
            (EventKind::Comment, None, None) => return Err(ContextError::MissingTarget),
            (event, None, _) => return Err(ContextError::MissingPullRequest { event }),
        };

        let comment = match (self.event, comment) {
            (EventKind::Comment, None) => return Err(ContextError::MissingComment),
            (_, comment) => comment,
        };

        let token = self
            .token
            .or_else(|| fallback_env("GITHUB_TOKEN"))
            .filter(|t| !t.trim().is_empty())
            .ok_or(ContextError::MissingToken)?;

        let workspace = self
            .workspace
            .or_else(|| fallback_env("GITHUB_WORKSPACE").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Invocation {
            event: self.event,
            repo,
            target,
            comment,
            token: Token(token),
            workspace,
        })
    }
}

fn positive(value: Option<u64>, field: &'static str) -> Result<Option<u64>, ContextError> {
    match value {
        Some(0) => Err(ContextError::Zero { field }),
        other => Ok(other),
    }
}

/// The issue or pull request the event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub number: IssueNumber,
    pub kind: ChangeKind,
}

/// An API token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Validated, immutable description of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub event: EventKind,
    pub repo: RepoId,
    pub target: Target,
    /// Present for comment events.
    pub comment: Option<CommentId>,
    pub token: Token,
    pub workspace: PathBuf,
}

impl Invocation {
    /// Builds an invocation directly, for embedding and tests.
    pub fn new(event: EventKind, repo: RepoId, target: Target, workspace: PathBuf) -> Self {
        Invocation {
            event,
            repo,
            target,
            comment: None,
            token: Token(String::new()),
            workspace,
        }
    }

    pub fn with_comment(mut self, comment: CommentId) -> Self {
        self.comment = Some(comment);
        self
    }
}
