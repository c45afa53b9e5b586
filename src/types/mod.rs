//! Core domain types for the approval gate.
//!
//! This module contains the identifiers and per-invocation data shapes used
//! throughout the crate.

pub mod change;
pub mod ids;

// Re-export commonly used types at the module level
pub use change::{ChangeKind, ChangeUnit};
pub use ids::{CommentId, InvalidRepoId, IssueNumber, RepoId, Sha};
