//! Status comment rendering.
//!
//! Output depends only on the report. Names and files come from ordered sets
//! or the pull request's own file order, so rendering the same inputs twice
//! yields the same bytes.

use std::fmt::Write as _;

use super::STATUS_MARKER;
use super::report::{FileStatus, StatusReport};

/// GitHub's comment size limit (65536 characters).
pub const GITHUB_COMMENT_SIZE_LIMIT: usize = 65536;

/// Room kept free for the header and footer when trimming the file list.
const FRAME_RESERVE: usize = 2048;

/// Renders the status comment body.
///
/// ```text
/// [APPROVALNOTIFIER] This PR is __NOT APPROVED__
///
/// This pull-request has been approved by: *carol, dave*
///
/// <details open>
/// Needs approval from an approver in each of these files:
///
/// - **`src/net/socket.rs`** (alice, bob)
/// - ~~`docs/README.md`~~ [carol]
/// ...
/// </details>
/// ```
pub fn format_status_comment(report: &StatusReport) -> String {
    let approved = report.is_approved();
    let mut body = String::new();

    let verdict = if approved { "APPROVED" } else { "NOT APPROVED" };
    let _ = write!(body, "{} This PR is __{}__\n\n", STATUS_MARKER, verdict);

    let credited: Vec<&str> = report.credited.iter().map(String::as_str).collect();
    let _ = write!(
        body,
        "This pull-request has been approved by: *{}*\n\n",
        credited.join(", ")
    );

    body.push_str(if approved {
        "<details>\n"
    } else {
        "<details open>\n"
    });
    body.push_str("Needs approval from an approver in each of these files:\n\n");

    let budget = GITHUB_COMMENT_SIZE_LIMIT.saturating_sub(FRAME_RESERVE);
    for (shown, file) in report.files.iter().enumerate() {
        let line = format_file_line(file);
        if body.len() + line.len() > budget {
            let _ = writeln!(
                body,
                "- ... and {} more files",
                report.files.len() - shown
            );
            break;
        }
        body.push_str(&line);
    }

    body.push('\n');
    body.push_str("Approvers can indicate their approval by writing `/approve` in a comment.\n");
    body.push_str("Approvers can cancel approval by writing `/approve cancel` in a comment.\n");
    body.push_str("</details>\n");
    body
}

/// One checklist line. Unsatisfied files are bold with their eligible
/// approvers; satisfied files are struck through with who approved them.
fn format_file_line(file: &FileStatus) -> String {
    let path = code_span(&file.path);
    if file.is_satisfied() {
        format!("- ~~{}~~ [{}]\n", path, file.approved_by.join(", "))
    } else {
        let eligible: Vec<&str> = file.eligible.iter().map(String::as_str).collect();
        format!("- **{}** ({})\n", path, eligible.join(", "))
    }
}

/// Wraps `text` in an inline code span so markdown in a file name renders
/// literally.
///
/// The fence is one backtick longer than the longest backtick run inside
/// `text`. Line breaks become spaces so the span stays on its list line.
fn code_span(text: &str) -> String {
    let text = text.replace(['\r', '\n'], " ");
    let longest_run = text.split(|c: char| c != '`').map(str::len).max().unwrap_or(0);
    let fence = "`".repeat(longest_run + 1);
    let pad = if text.starts_with('`') || text.ends_with('`') {
        " "
    } else {
        ""
    };
    format!("{fence}{pad}{text}{pad}{fence}")
}
