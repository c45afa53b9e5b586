//! Owners Gate - approval gating for pull requests driven by `OWNERS` files.
//!
//! Each run handles one repository event (a new pull request, a comment,
//! a merge check or a CI completion). Approval requirements come from
//! per-directory `OWNERS` manifests in the checkout; approvals come from
//! `/approve` and `/lgtm` comments; merging waits until the required labels
//! are applied and every check run has passed.

pub mod broker;
pub mod commands;
pub mod config;
pub mod context;
pub mod effects;
pub mod github;
pub mod ledger;
pub mod owners;
pub mod readiness;
pub mod status;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;
