//! Filesystem-backed ownership resolution.
//!
//! Resolution walks from the directory containing a path up to the repository
//! root (the first directory holding `.git/config`), unioning every `OWNERS`
//! manifest found on the way. Both ends of the walk are inclusive.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::alias::AliasTable;
use super::error::{OwnersError, UnresolvedFiles};
use super::list::{OwnersEntry, OwnersList};
use super::{ALIASES_FILE_NAME, OWNERS_FILE_NAME, REPO_ROOT_MARKER};

/// Ownership resolved for one changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOwners {
    /// The repository-relative path as reported by the pull request.
    pub path: String,
    pub owners: OwnersList,
}

/// Ownership resolved for a whole set of changed files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedFilesOwners {
    /// Union over every changed file.
    pub aggregate: OwnersList,
    /// Per-file results, in input order.
    pub files: Vec<FileOwners>,
}

/// Source of ownership data.
///
/// The broker only talks to this trait, so tests can substitute an in-memory
/// store for the filesystem.
pub trait OwnersStore {
    /// Reads the manifest in a single directory, if there is one.
    fn directory_owners(&self, dir: &Path) -> Result<Option<OwnersEntry>, OwnersError>;

    /// Aggregates every manifest from the repository root down to `path`.
    fn resolve_for_path(&self, path: &Path) -> Result<OwnersList, OwnersError>;

    /// Loads the alias table of the repository containing `path`.
    fn resolve_aliases(&self, path: &Path) -> Result<AliasTable, OwnersError>;

    /// Resolves each changed file independently and unions the results.
    ///
    /// `files` are relative to `workspace`. Every file is attempted; failures
    /// are collected and reported together. A non-empty batch that finds no
    /// manifest at all is reported as [`OwnersError::NoOwnersFound`].
    fn resolve_for_changed_files(
        &self,
        workspace: &Path,
        files: &[String],
    ) -> Result<ChangedFilesOwners, OwnersError> {
        let mut resolved = ChangedFilesOwners::default();
        let mut failures = Vec::new();

        for file in files {
            let target = nearest_existing(workspace, &workspace.join(file));
            match self.resolve_for_path(&target) {
                Ok(owners) => {
                    debug!(
                        file = %file,
                        approvers = owners.approvers.len(),
                        manifests = owners.files.len(),
                        "resolved owners"
                    );
                    resolved.aggregate.merge(&owners);
                    resolved.files.push(FileOwners {
                        path: file.clone(),
                        owners,
                    });
                }
                Err(e) => {
                    warn!(file = %file, error = %e, "failed to resolve owners");
                    failures.push((file.clone(), e));
                }
            }
        }

        if !failures.is_empty() {
            return Err(OwnersError::Unresolved(UnresolvedFiles(failures)));
        }
        if !files.is_empty() && resolved.aggregate.files.is_empty() {
            return Err(OwnersError::NoOwnersFound);
        }
        Ok(resolved)
    }

    /// Reads the manifest at the repository root containing `path`.
    fn root_owners(&self, path: &Path) -> Result<OwnersList, OwnersError> {
        let root = find_repo_root(path)?;
        Ok(self
            .directory_owners(&root)?
            .map(OwnersList::from)
            .unwrap_or_default())
    }
}

/// The on-disk implementation of [`OwnersStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOwnersStore;

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    approvers: Vec<String>,
    #[serde(default)]
    reviewers: Vec<String>,
}

impl OwnersStore for FsOwnersStore {
    fn directory_owners(&self, dir: &Path) -> Result<Option<OwnersEntry>, OwnersError> {
        let manifest_path = dir.join(OWNERS_FILE_NAME);
        if !manifest_path.is_file() {
            return Ok(None);
        }
        debug!(path = %manifest_path.display(), "parsing owners file");
        let manifest: Manifest = read_yaml(&manifest_path)?;
        Ok(Some(OwnersEntry::new(
            manifest_path,
            manifest.approvers,
            manifest.reviewers,
        )))
    }

    fn resolve_for_path(&self, path: &Path) -> Result<OwnersList, OwnersError> {
        let start = containing_dir(path)?;
        let mut list = OwnersList::new();
        let mut dir = start.as_path();
        loop {
            if let Some(entry) = self.directory_owners(dir)? {
                list.add_entry(entry);
            }
            if is_repo_root(dir) {
                return Ok(list);
            }
            dir = dir.parent().ok_or_else(|| OwnersError::RootNotFound {
                path: path.to_path_buf(),
            })?;
        }
    }

    fn resolve_aliases(&self, path: &Path) -> Result<AliasTable, OwnersError> {
        let root = find_repo_root(path)?;
        let alias_path = root.join(ALIASES_FILE_NAME);
        if !alias_path.is_file() {
            debug!(root = %root.display(), "no alias file in repository");
            return Ok(AliasTable::default());
        }
        read_yaml(&alias_path)
    }
}

/// Returns true if `dir` carries the repository root marker.
pub fn is_repo_root(dir: &Path) -> bool {
    dir.join(REPO_ROOT_MARKER).exists()
}

/// Walks upward from `path` to the repository root.
pub fn find_repo_root(path: &Path) -> Result<PathBuf, OwnersError> {
    let start = containing_dir(path)?;
    start
        .ancestors()
        .find(|dir| is_repo_root(dir))
        .map(Path::to_path_buf)
        .ok_or_else(|| OwnersError::RootNotFound {
            path: path.to_path_buf(),
        })
}

/// Returns `path` made absolute if it is a directory, or its parent if it is
/// anything else.
///
/// Symlinks are not followed: a link is owned by the directory it sits in,
/// not by the directory of its target.
fn containing_dir(path: &Path) -> Result<PathBuf, OwnersError> {
    let meta = fs::symlink_metadata(path).map_err(|e| io_error(path, e))?;
    let abs = lexical_absolute(path).map_err(|e| io_error(path, e))?;
    if meta.is_dir() {
        return Ok(abs);
    }
    abs.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| OwnersError::RootNotFound {
            path: path.to_path_buf(),
        })
}

/// Makes `path` absolute and folds `.` and `..` components without touching
/// the filesystem.
fn lexical_absolute(path: &Path) -> io::Result<PathBuf> {
    let mut out = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Returns `target` if it exists, otherwise its closest existing ancestor
/// that is still inside `workspace`.
///
/// Files deleted by a pull request are gone from the checkout but still need
/// an owner, so they resolve from the nearest directory that remains.
fn nearest_existing(workspace: &Path, target: &Path) -> PathBuf {
    if target.symlink_metadata().is_ok() {
        return target.to_path_buf();
    }
    target
        .ancestors()
        .skip(1)
        .take_while(|dir| dir.starts_with(workspace))
        .find(|dir| dir.symlink_metadata().is_ok())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| target.to_path_buf())
}

fn io_error(path: &Path, source: io::Error) -> OwnersError {
    if source.kind() == io::ErrorKind::NotFound {
        OwnersError::PathNotFound {
            path: path.to_path_buf(),
        }
    } else {
        OwnersError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reads a YAML document, treating a file with no content besides comments
/// as the default value.
fn read_yaml<T: DeserializeOwned + Default>(path: &Path) -> Result<T, OwnersError> {
    let text = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let has_content = text
        .lines()
        .map(str::trim)
        .any(|l| !l.is_empty() && !l.starts_with('#'));
    if !has_content {
        return Ok(T::default());
    }
    serde_yaml::from_str(&text).map_err(|source| OwnersError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    const ROOT_OWNERS: &str = "# See the OWNERS docs\nreviewers:\n  - reviewer1 # lead\n  - reviewer2 # lead\napprovers:\n  - approver1 # lead\n  - approver2 # lead\n  - approver3 # lead\n";

    const SUB_OWNERS: &str = "reviewers:\n  - user3 # user\n  - user4 # other user\napprovers:\n  - approver3 # lead\n  - approver4 # lead\n";

    fn mk_repo() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git").join("config"), "\n").unwrap();
        dir
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn reads_directory_owners() {
        let repo = mk_repo();
        write(repo.path(), "OWNERS", ROOT_OWNERS);

        let entry = FsOwnersStore
            .directory_owners(repo.path())
            .unwrap()
            .unwrap();

        assert_eq!(entry.reviewers.len(), 2);
        assert_eq!(entry.approvers.len(), 3);
        assert_eq!(entry.source, repo.path().join(OWNERS_FILE_NAME));
    }

    #[test]
    fn directory_without_manifest_is_empty_not_error() {
        let repo = mk_repo();
        assert!(FsOwnersStore.directory_owners(repo.path()).unwrap().is_none());
    }

    #[test]
    fn resolve_unions_root_and_subdirectory() {
        let repo = mk_repo();
        write(repo.path(), "OWNERS", ROOT_OWNERS);
        write(repo.path(), "sub/OWNERS", SUB_OWNERS);

        let owners = FsOwnersStore
            .resolve_for_path(&repo.path().join("sub"))
            .unwrap();

        assert_eq!(owners.reviewers.len(), 4);
        assert_eq!(owners.approvers.len(), 4);
        assert_eq!(owners.files.len(), 2);
    }

    #[test]
    fn resolve_file_in_subdirectory_includes_every_ancestor() {
        let repo = mk_repo();
        write(repo.path(), "OWNERS", "approvers:\n  - alice\n");
        write(repo.path(), "sub/OWNERS", "approvers:\n  - bob\n");
        write(repo.path(), "sub/deep/code.rs", "fn main() {}\n");

        let owners = FsOwnersStore
            .resolve_for_path(&repo.path().join("sub/deep/code.rs"))
            .unwrap();

        assert_eq!(names(&owners.approvers), vec!["alice", "bob"]);
    }

    #[test]
    fn manifests_outside_the_ancestor_chain_do_not_contribute() {
        let repo = mk_repo();
        write(repo.path(), "OWNERS", "approvers:\n  - alice\n");
        write(repo.path(), "a/OWNERS", "approvers:\n  - bob\n");
        write(repo.path(), "b/OWNERS", "approvers:\n  - carol\n");
        write(repo.path(), "a/file.txt", "x");

        let owners = FsOwnersStore
            .resolve_for_path(&repo.path().join("a/file.txt"))
            .unwrap();

        assert_eq!(names(&owners.approvers), vec!["alice", "bob"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_is_owned_by_its_own_directory_not_its_target() {
        let repo = mk_repo();
        write(repo.path(), "OWNERS", "approvers:\n  - alice\n");
        write(repo.path(), "secure/OWNERS", "approvers:\n  - bob\n");
        write(repo.path(), "public/OWNERS", "approvers:\n  - eve\n");
        write(repo.path(), "public/readme", "hello\n");
        std::os::unix::fs::symlink("../public/readme", repo.path().join("secure/link")).unwrap();

        let owners = FsOwnersStore
            .resolve_for_path(&repo.path().join("secure/link"))
            .unwrap();
        assert_eq!(names(&owners.approvers), vec!["alice", "bob"]);

        let resolved = FsOwnersStore
            .resolve_for_changed_files(repo.path(), &["secure/link".to_string()])
            .unwrap();
        assert_eq!(names(&resolved.aggregate.approvers), vec!["alice", "bob"]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_still_resolves_from_its_directory() {
        let repo = mk_repo();
        write(repo.path(), "OWNERS", "approvers:\n  - alice\n");
        write(repo.path(), "secure/OWNERS", "approvers:\n  - bob\n");
        std::os::unix::fs::symlink("../gone", repo.path().join("secure/stale")).unwrap();

        let resolved = FsOwnersStore
            .resolve_for_changed_files(repo.path(), &["secure/stale".to_string()])
            .unwrap();
        assert_eq!(names(&resolved.aggregate.approvers), vec!["alice", "bob"]);
    }

    #[test]
    fn parent_components_are_folded_before_walking_up() {
        let repo = mk_repo();
        write(repo.path(), "OWNERS", "approvers:\n  - alice\n");
        write(repo.path(), "a/OWNERS", "approvers:\n  - bob\n");
        write(repo.path(), "b/OWNERS", "approvers:\n  - carol\n");
        write(repo.path(), "b/file.txt", "x");

        let owners = FsOwnersStore
            .resolve_for_path(&repo.path().join("a/../b/file.txt"))
            .unwrap();
        assert_eq!(names(&owners.approvers), vec!["alice", "carol"]);
    }

    #[test]
    fn manifests_above_the_repository_root_do_not_contribute() {
        let outer = tempfile::tempdir().unwrap();
        write(outer.path(), "OWNERS", "approvers:\n  - outsider\n");
        write(outer.path(), "repo/.git/config", "\n");
        write(outer.path(), "repo/OWNERS", "approvers:\n  - insider\n");

        let owners = FsOwnersStore
            .resolve_for_path(&outer.path().join("repo"))
            .unwrap();

        assert_eq!(names(&owners.approvers), vec!["insider"]);
    }

    #[test]
    fn missing_path_is_path_not_found() {
        let repo = mk_repo();
        let err = FsOwnersStore
            .resolve_for_path(&repo.path().join("nope.txt"))
            .unwrap_err();
        assert!(matches!(err, OwnersError::PathNotFound { .. }), "{err}");
    }

    #[test]
    fn missing_root_is_resolution_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "OWNERS", "approvers:\n  - alice\n");

        let err = FsOwnersStore.resolve_for_path(dir.path()).unwrap_err();
        assert!(matches!(err, OwnersError::RootNotFound { .. }), "{err}");
    }

    #[test]
    fn comment_only_manifest_is_empty() {
        let repo = mk_repo();
        write(repo.path(), "OWNERS", "# nobody yet\n\n");

        let entry = FsOwnersStore
            .directory_owners(repo.path())
            .unwrap()
            .unwrap();
        assert!(entry.approvers.is_empty());
        assert!(entry.reviewers.is_empty());
    }

    #[test]
    fn malformed_manifest_is_parse_error() {
        let repo = mk_repo();
        write(repo.path(), "OWNERS", "approvers: [unterminated\n");

        let err = FsOwnersStore.directory_owners(repo.path()).unwrap_err();
        assert!(matches!(err, OwnersError::Parse { .. }), "{err}");
    }

    #[test]
    fn changed_files_resolve_independently() {
        let repo = mk_repo();
        write(repo.path(), "OWNERS", "approvers:\n  - alice\n");
        write(repo.path(), "docs/OWNERS", "approvers:\n  - dora\n");
        write(repo.path(), "docs/index.md", "#");
        write(repo.path(), "src/lib.rs", "//");

        let files = vec!["docs/index.md".to_string(), "src/lib.rs".to_string()];
        let resolved = FsOwnersStore
            .resolve_for_changed_files(repo.path(), &files)
            .unwrap();

        assert_eq!(names(&resolved.aggregate.approvers), vec!["alice", "dora"]);
        assert_eq!(resolved.files.len(), 2);
        assert_eq!(names(&resolved.files[0].owners.approvers), vec!["alice", "dora"]);
        assert_eq!(names(&resolved.files[1].owners.approvers), vec!["alice"]);
    }

    #[test]
    fn deleted_file_resolves_from_nearest_existing_directory() {
        let repo = mk_repo();
        write(repo.path(), "OWNERS", "approvers:\n  - alice\n");
        write(repo.path(), "sub/OWNERS", "approvers:\n  - bob\n");

        let files = vec!["sub/removed/old.rs".to_string()];
        let resolved = FsOwnersStore
            .resolve_for_changed_files(repo.path(), &files)
            .unwrap();

        assert_eq!(names(&resolved.files[0].owners.approvers), vec!["alice", "bob"]);
    }

    #[test]
    fn no_manifest_anywhere_is_no_owners_found() {
        let repo = mk_repo();
        write(repo.path(), "src/lib.rs", "//");

        let files = vec!["src/lib.rs".to_string()];
        let err = FsOwnersStore
            .resolve_for_changed_files(repo.path(), &files)
            .unwrap_err();
        assert!(matches!(err, OwnersError::NoOwnersFound), "{err}");
    }

    #[test]
    fn empty_change_set_resolves_to_nothing() {
        let repo = mk_repo();
        let resolved = FsOwnersStore
            .resolve_for_changed_files(repo.path(), &[])
            .unwrap();
        assert!(resolved.aggregate.is_empty());
    }

    #[test]
    fn batch_failures_are_collected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "a");
        write(dir.path(), "b.txt", "b");

        let files = vec!["a.txt".to_string(), "b.txt".to_string()];
        let err = FsOwnersStore
            .resolve_for_changed_files(dir.path(), &files)
            .unwrap_err();

        match err {
            OwnersError::Unresolved(UnresolvedFiles(failures)) => {
                assert_eq!(failures.len(), 2);
                assert!(
                    failures
                        .iter()
                        .all(|(_, e)| matches!(e, OwnersError::RootNotFound { .. }))
                );
            }
            other => panic!("expected Unresolved, got {other}"),
        }
    }

    #[test]
    fn aliases_found_from_any_path_in_repo() {
        let repo = mk_repo();
        write(
            repo.path(),
            ALIASES_FILE_NAME,
            "aliases:\n  release-engineering-approvers:\n    - jeefy\n    - puerco\n    - saschagrunert\n  sig-release-leads:\n    - cpanato\n    - justaugustus\n",
        );
        fs::create_dir(repo.path().join("sub")).unwrap();

        for path in [
            repo.path().to_path_buf(),
            repo.path().join("sub"),
            repo.path().join(ALIASES_FILE_NAME),
        ] {
            let aliases = FsOwnersStore.resolve_aliases(&path).unwrap();
            assert_eq!(aliases.len(), 2, "from {}", path.display());
        }

        let err = FsOwnersStore
            .resolve_aliases(&repo.path().join("sub").join("hello.txt"))
            .unwrap_err();
        assert!(matches!(err, OwnersError::PathNotFound { .. }));
    }

    #[test]
    fn missing_alias_file_is_empty_table() {
        let repo = mk_repo();
        let aliases = FsOwnersStore.resolve_aliases(repo.path()).unwrap();
        assert!(aliases.is_empty());
    }

    #[test]
    fn root_owners_reads_only_the_root_manifest() {
        let repo = mk_repo();
        write(repo.path(), "OWNERS", "approvers:\n  - alice\nreviewers:\n  - rita\n");
        write(repo.path(), "sub/OWNERS", "approvers:\n  - bob\n");

        let root = FsOwnersStore
            .root_owners(&repo.path().join("sub"))
            .unwrap();
        assert_eq!(names(&root.approvers), vec!["alice"]);
        assert_eq!(names(&root.reviewers), vec!["rita"]);
    }
}
