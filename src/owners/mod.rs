//! Hierarchical ownership manifests.
//!
//! Each directory of a repository may carry an `OWNERS` manifest listing the
//! users allowed to approve and review changes beneath it:
//!
//! ```yaml
//! approvers:
//!   - alice
//!   - release-managers   # an alias from OWNERS_ALIASES
//! reviewers:
//!   - bob
//! ```
//!
//! The required approvers of a path are the union of every manifest between
//! the repository root and the path's directory, inclusive. Aliases are
//! defined once per repository in `OWNERS_ALIASES` at the root and are
//! expanded when checking who may approve.
//!
//! # Example
//!
//! ```
//! use owners_gate::owners::{AliasTable, OwnersEntry, OwnersList};
//!
//! let root = OwnersList::from(OwnersEntry::new("/repo/OWNERS", ["alice"], ["rita"]));
//! let sub = OwnersList::from(OwnersEntry::new("/repo/sub/OWNERS", ["bob"], Vec::<String>::new()));
//! let merged = root.merged(&sub);
//!
//! let approvers: Vec<_> = merged.approvers.iter().map(String::as_str).collect();
//! assert_eq!(approvers, ["alice", "bob"]);
//! ```

mod alias;
mod error;
mod list;
mod resolver;

pub use alias::AliasTable;
pub use error::{OwnersError, UnresolvedFiles};
pub use list::{OwnersEntry, OwnersList};
pub use resolver::{
    ChangedFilesOwners, FileOwners, FsOwnersStore, OwnersStore, find_repo_root, is_repo_root,
};

/// Name of the per-directory ownership manifest.
pub const OWNERS_FILE_NAME: &str = "OWNERS";

/// Name of the repository-wide alias file.
pub const ALIASES_FILE_NAME: &str = "OWNERS_ALIASES";

/// Path, relative to a directory, whose presence marks the repository root.
pub const REPO_ROOT_MARKER: &str = ".git/config";
