//! Parser for slash commands in comment text.
//!
//! Pure function from comment body to commands; no I/O.

use super::types::SlashCommand;

/// Parses every slash command in `body`, in textual order.
///
/// # Parsing Rules
///
/// - Each line is considered on its own
/// - A line is a command iff its first whitespace-delimited token starts with
///   `/` and has at least one character after the slash
/// - The token after the slash is the command name; the rest are arguments
/// - A lone `/`, or a slash that is not at the start of the first token, is
///   not a command
///
/// # Examples
///
/// ```
/// use owners_gate::commands::parse_commands;
///
/// let cmds = parse_commands("LGTM!\n/lgtm\n/approve cancel");
/// assert_eq!(cmds.len(), 2);
/// assert_eq!(cmds[0].name, "lgtm");
/// assert_eq!(cmds[1].args, vec!["cancel"]);
///
/// assert!(parse_commands("this is not /at the start").is_empty());
/// assert!(parse_commands("/ nothing").is_empty());
/// ```
pub fn parse_commands(body: &str) -> Vec<SlashCommand> {
    body.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<SlashCommand> {
    let mut tokens = line.split_whitespace();
    let name = tokens.next()?.strip_prefix('/')?;
    if name.is_empty() {
        return None;
    }
    Some(SlashCommand::new(name, tokens.map(str::to_string).collect()))
}
