//! Broker configuration.
//!
//! Read from `.owners-gate/config.yaml` under the repository root:
//!
//! ```yaml
//! required_labels:
//!   - approved
//!   - lgtm
//! auto_merge: true
//! ```
//!
//! Both keys are optional. A missing file means defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Location of the configuration file relative to the repository root.
pub const CONFIG_PATH: &str = ".owners-gate/config.yaml";

/// Errors loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("required_labels must not contain empty names")]
    EmptyLabel,
}

/// Settings that shape merge gating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    /// Labels that must all be present before a merge.
    pub required_labels: Vec<String>,

    /// Lets a new PR from a root approver who is also a root reviewer get
    /// `lgtm` without a separate review.
    pub auto_merge: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            required_labels: vec!["approved".to_string(), "lgtm".to_string()],
            auto_merge: true,
        }
    }
}

impl BrokerConfig {
    /// Loads `.owners-gate/config.yaml` from `repo_root`.
    pub fn load(repo_root: &Path) -> Result<Self, ConfigError> {
        let path = repo_root.join(CONFIG_PATH);
        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_yaml(&contents).map_err(|e| match e {
                ConfigError::Parse { source, .. } => ConfigError::Parse { path, source },
                other => other,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no configuration file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    /// Parses configuration from YAML text. Blank input means defaults.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Option<BrokerConfig> =
            serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
                path: PathBuf::from(CONFIG_PATH),
                source,
            })?;
        let config = config.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.required_labels.iter().any(|l| l.trim().is_empty()) {
            return Err(ConfigError::EmptyLabel);
        }
        Ok(())
    }
}
