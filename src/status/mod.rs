//! The bot's running status comment.
//!
//! Each pull request carries at most one status comment. It is found by its
//! marker token together with authorship by the bot account, and is replaced
//! (deleted, then posted again) whenever approval state may have changed.
//!
//! # Format
//!
//! ```text
//! [APPROVALNOTIFIER] This PR is __NOT APPROVED__
//!
//! This pull-request has been approved by: *carol, dave*
//!
//! <details open>
//! Needs approval from an approver in each of these files:
//!
//! - **`src/lib.rs`** (alice, bob)
//! - ~~`docs/guide.md`~~ [carol]
//! ...
//! </details>
//! ```

pub mod format;
pub mod report;

pub use format::{GITHUB_COMMENT_SIZE_LIMIT, format_status_comment};
pub use report::{FileStatus, StatusReport};

use crate::effects::CommentData;

/// Token that opens every status comment.
pub const STATUS_MARKER: &str = "[APPROVALNOTIFIER]";

/// True when `comment` is a status comment posted by `bot_login`.
pub fn is_status_comment(comment: &CommentData, bot_login: &str) -> bool {
    comment.author == bot_login && comment.body.contains(STATUS_MARKER)
}

/// Every status comment posted by `bot_login`, oldest first.
///
/// Normally there is at most one, but two runs racing on the same pull
/// request can each post one.
pub fn status_comments<'a>(
    comments: &'a [CommentData],
    bot_login: &'a str,
) -> impl Iterator<Item = &'a CommentData> {
    comments.iter().filter(move |c| is_status_comment(c, bot_login))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CommentId;

    fn comment(id: u64, author: &str, body: &str) -> CommentData {
        CommentData {
            id: CommentId(id),
            author: author.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn marker_and_author_must_both_match() {
        let bot = "gate-bot";
        assert!(is_status_comment(
            &comment(1, bot, "[APPROVALNOTIFIER] This PR is __APPROVED__"),
            bot
        ));
        // Quoted by a human.
        assert!(!is_status_comment(
            &comment(2, "carol", "> [APPROVALNOTIFIER] This PR is __APPROVED__"),
            bot
        ));
        // Bot comment without the marker.
        assert!(!is_status_comment(&comment(3, bot, "/tests-done"), bot));
    }

    #[test]
    fn lists_every_status_comment_in_order() {
        let bot = "gate-bot";
        let comments = vec![
            comment(1, bot, "[APPROVALNOTIFIER] old"),
            comment(2, "carol", "[APPROVALNOTIFIER] quoted"),
            comment(3, bot, "[APPROVALNOTIFIER] newer"),
        ];
        let ids: Vec<_> = status_comments(&comments, bot).map(|c| c.id).collect();
        assert_eq!(ids, [CommentId(1), CommentId(3)]);
    }
}
