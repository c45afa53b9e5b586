//! Ownership manifests and their aggregation.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::alias::AliasTable;

/// One parsed ownership manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnersEntry {
    /// Path of the manifest file this entry was read from.
    pub source: PathBuf,
    pub approvers: BTreeSet<String>,
    pub reviewers: BTreeSet<String>,
}

impl OwnersEntry {
    pub fn new(
        source: impl Into<PathBuf>,
        approvers: impl IntoIterator<Item = impl Into<String>>,
        reviewers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        OwnersEntry {
            source: source.into(),
            approvers: approvers.into_iter().map(Into::into).collect(),
            reviewers: reviewers.into_iter().map(Into::into).collect(),
        }
    }
}

/// Aggregated ownership across one or more manifests.
///
/// Merging is a set union of approvers, reviewers and contributing manifests,
/// so it is commutative and idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnersList {
    pub approvers: BTreeSet<String>,
    pub reviewers: BTreeSet<String>,
    /// Contributing manifests keyed by their source path.
    pub files: BTreeMap<PathBuf, OwnersEntry>,
}

impl OwnersList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no manifest contributed to this list.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.approvers.is_empty() && self.reviewers.is_empty()
    }

    /// Unions a single manifest into the list.
    pub fn add_entry(&mut self, entry: OwnersEntry) {
        self.approvers.extend(entry.approvers.iter().cloned());
        self.reviewers.extend(entry.reviewers.iter().cloned());
        self.files.entry(entry.source.clone()).or_insert(entry);
    }

    /// Unions another list into this one.
    ///
    /// When both sides carry a manifest with the same source path, the one
    /// already present is kept.
    pub fn merge(&mut self, other: &OwnersList) {
        self.approvers.extend(other.approvers.iter().cloned());
        self.reviewers.extend(other.reviewers.iter().cloned());
        for (path, entry) in &other.files {
            self.files
                .entry(path.clone())
                .or_insert_with(|| entry.clone());
        }
    }

    /// Returns the union of two lists without modifying either.
    pub fn merged(mut self, other: &OwnersList) -> OwnersList {
        self.merge(other);
        self
    }

    /// Returns the candidates allowed to approve under this list, sorted.
    ///
    /// Approver names that refer to an alias are expanded to the alias
    /// members before matching.
    pub fn who_can_approve(
        &self,
        candidates: &BTreeSet<String>,
        aliases: &AliasTable,
    ) -> Vec<String> {
        let eligible = aliases.expand(&self.approvers);
        candidates
            .iter()
            .filter(|c| eligible.contains(*c))
            .cloned()
            .collect()
    }
}

impl From<OwnersEntry> for OwnersList {
    fn from(entry: OwnersEntry) -> Self {
        let mut list = OwnersList::new();
        list.add_entry(entry);
        list
    }
}
