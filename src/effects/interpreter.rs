//! Effect interpreter trait.
//!
//! The trait-based design enables:
//! - Mock interpreters for testing
//! - Logging/tracing interpreters
//! - Swapping the transport without touching the broker

use std::future::Future;

use super::github::{GitHubEffect, GitHubResponse};

/// Errors an interpreter can report.
pub trait InterpreterError: std::error::Error + Send + Sync + 'static {
    /// True when the effect's target (issue, comment, label) does not exist.
    fn is_not_found(&self) -> bool;
}

/// Interprets GitHub effects against the GitHub API.
///
/// Implementations are constructed with a `RepoId`, so all effects executed
/// through a single interpreter instance are scoped to that repository.
/// Retrying transient failures is the interpreter's job; callers see either a
/// response or a final error.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct MockGitHub {
///     responses: HashMap<GitHubEffect, GitHubResponse>,
/// }
///
/// impl GitHubInterpreter for MockGitHub {
///     type Error = MockError;
///
///     async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
///         self.responses.get(&effect)
///             .cloned()
///             .ok_or_else(|| MockError::not_found(effect.name()))
///     }
/// }
/// ```
pub trait GitHubInterpreter {
    /// The error type returned by this interpreter.
    type Error: InterpreterError;

    /// Execute a GitHub effect and return its response.
    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send;
}
