//! Effects-as-data for GitHub operations.
//!
//! This module defines effect types that describe operations without executing them.
//! This enables:
//! - Broker logic that reads as a sequence of named API calls
//! - Testability via mock interpreters that record what was attempted
//! - Logging/tracing of intended operations

pub mod github;
pub mod interpreter;

pub use github::{
    CheckRunData, CommentData, GitHubEffect, GitHubResponse, IssueData, PullRequestData,
};
pub use interpreter::{GitHubInterpreter, InterpreterError};
