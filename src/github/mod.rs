//! GitHub API client and effect interpreter.
//!
//! Executes `GitHubEffect`s through octocrab. Transient failures (5xx, rate
//! limits, network errors) are retried a bounded number of times; permanent
//! failures surface on the first attempt.

mod client;
mod error;
mod interpreter;
mod retry;

pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::interpret_github_effect;
pub use retry::{RetryConfig, RetryPolicy, RetryResult, retry_with_backoff};
