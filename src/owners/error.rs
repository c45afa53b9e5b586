//! Errors raised while resolving ownership.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// An ownership resolution failure.
#[derive(Debug, Error)]
pub enum OwnersError {
    /// The path to resolve does not exist.
    #[error("path not found: {}", path.display())]
    PathNotFound { path: PathBuf },

    /// No repository root marker was found walking up from the path.
    #[error("unable to detect repository root above {}", path.display())]
    RootNotFound { path: PathBuf },

    /// Not a single manifest contributed to any of the changed files.
    #[error("no approvers were found for the changed files; missing OWNERS file(s)?")]
    NoOwnersFound,

    /// A manifest or alias file could not be read.
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest or alias file is not valid YAML of the expected shape.
    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// One or more files of a batch failed to resolve.
    #[error("{0}")]
    Unresolved(UnresolvedFiles),
}

/// The per-file failures collected while resolving a batch of changed files.
#[derive(Debug)]
pub struct UnresolvedFiles(pub Vec<(String, OwnersError)>);

impl fmt::Display for UnresolvedFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unable to resolve owners for {} file(s)", self.0.len())?;
        for (path, err) in &self.0 {
            write!(f, "; {}: {}", path, err)?;
        }
        Ok(())
    }
}
