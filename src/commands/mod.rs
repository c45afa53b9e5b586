//! Slash commands issued through issue and pull request comments.
//!
//! # Supported Commands
//!
//! - `/approve` - Adds the `approved` label
//! - `/lgtm` - Adds the `lgtm` label
//! - `/approve cancel`, `/lgtm cancel` - Remove the corresponding label
//! - `/tests-done` - Re-evaluates merge readiness
//!
//! Any other `/name` line is parsed and logged but has no effect.
//!
//! # Example
//!
//! ```
//! use owners_gate::commands::{parse_commands, CommandHandler, LabelAction};
//!
//! let cmds = parse_commands("Looks good.\n/approve cancel");
//! assert_eq!(cmds.len(), 1);
//! assert_eq!(
//!     cmds[0].handler,
//!     CommandHandler::ToggleLabel { label: "approved".to_string() }
//! );
//! assert_eq!(cmds[0].label_action(), LabelAction::Remove);
//! ```

mod parser;
mod types;

pub use parser::parse_commands;
pub use types::{
    APPROVED_LABEL, CANCEL_ARG, CommandHandler, LABEL_COMMANDS, LGTM_LABEL, LabelAction,
    RECHECK_COMMAND, SlashCommand,
};
