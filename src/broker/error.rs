//! Broker error types.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::commands::SlashCommand;
use crate::config::ConfigError;
use crate::context::ContextError;
use crate::owners::OwnersError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Why a run failed.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The API call failed after the transport's own retries.
    #[error("{operation} failed: {source}")]
    Transport {
        operation: &'static str,
        source: BoxError,
    },

    /// The API reported the target as missing.
    #[error("{operation}: not found")]
    NotFound {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// The API answered with a response meant for a different request.
    #[error("{operation} returned an unexpected {got} response")]
    UnexpectedResponse {
        operation: &'static str,
        got: &'static str,
    },

    #[error("invalid invocation: {0}")]
    Validation(#[from] ContextError),

    #[error("resolving owners: {0}")]
    Resolution(#[from] OwnersError),

    #[error(transparent)]
    Commands(CommandFailures),

    /// A label change outside comment handling failed.
    #[error(transparent)]
    Command(Box<CommandError>),

    #[error("loading configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cancelled")]
    Cancelled,
}

impl BrokerError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BrokerError::Cancelled)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BrokerError::NotFound { .. })
    }
}

/// Why a single slash command failed.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("cannot apply label {label}: the repository does not have it")]
    UnknownLabel { label: String },

    #[error(transparent)]
    Broker(Box<BrokerError>),
}

impl From<BrokerError> for CommandError {
    fn from(err: BrokerError) -> Self {
        CommandError::Broker(Box::new(err))
    }
}

impl From<CommandError> for BrokerError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Broker(inner) => *inner,
            other => BrokerError::Command(Box::new(other)),
        }
    }
}

/// Every command in a comment that failed, in comment order.
#[derive(Debug)]
pub struct CommandFailures {
    /// Number of commands in the comment, including the ones that succeeded.
    pub attempted: usize,
    pub failures: Vec<(SlashCommand, CommandError)>,
}

impl fmt::Display for CommandFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} commands failed",
            self.failures.len(),
            self.attempted
        )?;
        for (command, err) in &self.failures {
            write!(f, "; {}: {}", command, err)?;
        }
        Ok(())
    }
}

impl StdError for CommandFailures {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failures_display_lists_each_failure() {
        let failures = CommandFailures {
            attempted: 3,
            failures: vec![
                (
                    SlashCommand::new("approve", Vec::new()),
                    CommandError::UnknownLabel {
                        label: "approved".to_string(),
                    },
                ),
                (
                    SlashCommand::new("lgtm", vec!["cancel".to_string()]),
                    CommandError::from(BrokerError::Cancelled),
                ),
            ],
        };

        assert_eq!(
            failures.to_string(),
            "2 of 3 commands failed; /approve: cannot apply label approved: \
             the repository does not have it; /lgtm cancel: cancelled"
        );
    }
}
