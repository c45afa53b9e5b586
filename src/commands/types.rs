//! Slash command types.

use serde::{Deserialize, Serialize};

/// Label applied by `/approve`.
pub const APPROVED_LABEL: &str = "approved";

/// Label applied by `/lgtm`.
pub const LGTM_LABEL: &str = "lgtm";

/// Command names that toggle a label, and the label each one toggles.
pub const LABEL_COMMANDS: &[(&str, &str)] = &[("approve", APPROVED_LABEL), ("lgtm", LGTM_LABEL)];

/// Command name that asks for merge readiness to be re-evaluated.
pub const RECHECK_COMMAND: &str = "tests-done";

/// First argument that turns a label command into a removal.
pub const CANCEL_ARG: &str = "cancel";

/// What running a command does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandHandler {
    /// Adds `label`, or removes it when the first argument is `cancel`.
    ToggleLabel { label: String },

    /// Re-evaluates merge readiness.
    Recheck,

    /// Unknown command. Logged and otherwise ignored.
    Noop,
}

impl CommandHandler {
    /// Looks up the handler for a command name. Names are case-sensitive.
    pub fn for_name(name: &str) -> Self {
        if name == RECHECK_COMMAND {
            return CommandHandler::Recheck;
        }
        LABEL_COMMANDS
            .iter()
            .find(|(command, _)| *command == name)
            .map(|(_, label)| CommandHandler::ToggleLabel {
                label: (*label).to_string(),
            })
            .unwrap_or(CommandHandler::Noop)
    }
}

/// Whether a label command adds or removes its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAction {
    Add,
    Remove,
}

/// One parsed command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlashCommand {
    /// Command name without the leading slash.
    pub name: String,
    /// Remaining whitespace-separated tokens, in order.
    pub args: Vec<String>,
    pub handler: CommandHandler,
}

impl SlashCommand {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        let name = name.into();
        let handler = CommandHandler::for_name(&name);
        SlashCommand {
            name,
            args,
            handler,
        }
    }

    /// Label toggling direction, decided by the first argument.
    pub fn label_action(&self) -> LabelAction {
        match self.args.first().map(String::as_str) {
            Some(CANCEL_ARG) => LabelAction::Remove,
            _ => LabelAction::Add,
        }
    }
}

impl std::fmt::Display for SlashCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_lookup() {
        assert_eq!(
            CommandHandler::for_name("approve"),
            CommandHandler::ToggleLabel {
                label: "approved".to_string()
            }
        );
        assert_eq!(
            CommandHandler::for_name("lgtm"),
            CommandHandler::ToggleLabel {
                label: "lgtm".to_string()
            }
        );
        assert_eq!(
            CommandHandler::for_name("tests-done"),
            CommandHandler::Recheck
        );
        assert_eq!(CommandHandler::for_name("assign"), CommandHandler::Noop);
        assert_eq!(CommandHandler::for_name("APPROVE"), CommandHandler::Noop);
    }

    #[test]
    fn cancel_only_counts_as_first_argument() {
        let cmd = SlashCommand::new("approve", vec!["cancel".to_string()]);
        assert_eq!(cmd.label_action(), LabelAction::Remove);

        let cmd = SlashCommand::new("approve", vec!["no".to_string(), "cancel".to_string()]);
        assert_eq!(cmd.label_action(), LabelAction::Add);

        let cmd = SlashCommand::new("lgtm", Vec::new());
        assert_eq!(cmd.label_action(), LabelAction::Add);
    }

    #[test]
    fn display_reconstructs_the_line() {
        let cmd = SlashCommand::new("assign", vec!["@user".to_string(), "now".to_string()]);
        assert_eq!(cmd.to_string(), "/assign @user now");
    }
}
