//! The broker: one triggering event, handled end to end.
//!
//! The broker picks a flow from the invocation's event kind and sequences
//! the owners resolver, the approval ledger, the command router and the
//! readiness evaluation against a [`GitHubInterpreter`]. It holds no state
//! between runs; everything is re-read from the API and the checkout.
//!
//! | Event         | Flow                                                    |
//! |---------------|---------------------------------------------------------|
//! | `new-pr`      | label root approvers' PRs, post the status comment      |
//! | `comment`     | run slash commands, refresh the status comment          |
//! | `check-merge` | evaluate readiness, merge when ready                    |
//! | `tests-done`  | post `/tests-done` so the comment flow re-evaluates     |

mod error;


pub use error::{BrokerError, CommandError, CommandFailures};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::commands::{
    APPROVED_LABEL, CommandHandler, LGTM_LABEL, LabelAction, RECHECK_COMMAND, SlashCommand,
    parse_commands,
};
use crate::config::BrokerConfig;
use crate::context::{ContextError, EventKind, Invocation};
use crate::effects::{
    CheckRunData, CommentData, GitHubEffect, GitHubInterpreter, GitHubResponse, InterpreterError,
    IssueData, PullRequestData,
};
use crate::ledger::{ApprovalLedger, ApprovalState};
use crate::owners::OwnersStore;
use crate::readiness::{MergeState, Readiness};
use crate::status::{StatusReport, format_status_comment, is_status_comment, status_comments};
use crate::types::{ChangeKind, ChangeUnit, CommentId, IssueNumber, Sha};

/// Commit message used for every merge.
pub const MERGE_COMMIT_MESSAGE: &str = "Merged by owners-gate after approval";

/// Extracts one response variant or reports a mismatched response.
macro_rules! expect_response {
    ($effect:expr, $response:expr, $pattern:pat => $value:expr) => {{
        let operation = $effect;
        match $response {
            $pattern => Ok($value),
            other => Err(BrokerError::UnexpectedResponse {
                operation,
                got: other.name(),
            }),
        }
    }};
}

/// Handles one event for one repository.
///
/// # Type Parameters
///
/// * `G` - The GitHub interpreter
/// * `O` - The ownership store
pub struct Broker<G, O> {
    github: G,
    owners: O,
    config: BrokerConfig,
    invocation: Invocation,
    cancel: CancellationToken,
}

impl<G, O> Broker<G, O>
where
    G: GitHubInterpreter,
    O: OwnersStore,
{
    pub fn new(github: G, owners: O, config: BrokerConfig, invocation: Invocation) -> Self {
        Broker {
            github,
            owners,
            config,
            invocation,
            cancel: CancellationToken::new(),
        }
    }

    /// Aborts in-flight and future API calls once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Runs the flow for the invocation's event.
    #[instrument(skip(self), fields(event = %self.invocation.event, number = %self.invocation.target.number))]
    pub async fn run(&self) -> Result<(), BrokerError> {
        info!(repo = %self.invocation.repo, "handling event");
        match self.invocation.event {
            EventKind::NewPr => self.handle_new_pr().await,
            EventKind::Comment => self.handle_comment().await,
            EventKind::CheckMerge => self.check_merge().await.map(|_| ()),
            EventKind::TestsDone => self.tests_done().await,
        }
    }

    // ─── Flows ────────────────────────────────────────────────────────────────

    /// Labels a new pull request whose author is a root approver, then posts
    /// the status comment.
    #[instrument(skip(self))]
    pub async fn handle_new_pr(&self) -> Result<(), BrokerError> {
        let number = self.pull_request_number(EventKind::NewPr)?;
        let pr = self.pull_request(number).await?;

        let workspace = &self.invocation.workspace;
        let root = self.owners.root_owners(workspace)?;
        let aliases = self.owners.resolve_aliases(workspace)?;
        let root_approvers = aliases.expand(&root.approvers);
        let root_reviewers = aliases.expand(&root.reviewers);

        if root_approvers.contains(&pr.author) {
            info!(author = %pr.author, "author is a root approver");
            self.add_label(number, APPROVED_LABEL).await?;

            if root_reviewers.contains(&pr.author) && self.config.auto_merge {
                info!(author = %pr.author, "author is also a root reviewer");
                self.add_label(number, LGTM_LABEL).await?;
            }
        }

        self.regenerate_status_comment(number).await.map(|_| ())
    }

    /// Runs the slash commands in the triggering comment.
    ///
    /// A status comment posted by the bot skips command parsing and goes
    /// straight to readiness evaluation. Otherwise every command runs, the
    /// status comment is refreshed, and command failures are reported
    /// together at the end.
    #[instrument(skip(self))]
    pub async fn handle_comment(&self) -> Result<(), BrokerError> {
        let comment_id = self
            .invocation
            .comment
            .ok_or(ContextError::MissingComment)?;
        let target = self.invocation.target;

        let comment = match self.comment(comment_id).await {
            Ok(comment) => comment,
            Err(e) if e.is_not_found() => {
                warn!(comment = %comment_id, "comment no longer exists, nothing to do");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let kind = self.change_kind().await?;
        let bot = self.bot_login().await?;
        if is_status_comment(&comment, &bot) {
            info!(comment = %comment_id, "status comment posted, evaluating readiness");
            if kind == ChangeKind::PullRequest {
                self.evaluate_and_merge(target.number, Some(comment.id))
                    .await?;
            }
            return Ok(());
        }

        let commands = parse_commands(comment.body.trim());
        info!(
            comment = %comment_id,
            author = %comment.author,
            commands = commands.len(),
            "parsed comment"
        );

        let mut failures = Vec::new();
        for command in &commands {
            match self.dispatch(kind, command).await {
                Ok(()) => {}
                Err(CommandError::Broker(e)) if e.is_cancelled() => return Err(*e),
                Err(e) => {
                    warn!(command = %command, error = %e, "command failed");
                    failures.push((command.clone(), e));
                }
            }
        }

        let refreshed = match kind {
            ChangeKind::PullRequest => self.regenerate_status_comment(target.number).await,
            ChangeKind::Issue => Ok(None),
        };

        if !failures.is_empty() {
            if let Err(e) = refreshed {
                error!(error = %e, "failed to refresh status comment");
            }
            return Err(BrokerError::Commands(CommandFailures {
                attempted: commands.len(),
                failures,
            }));
        }
        refreshed.map(|_| ())
    }

    /// Evaluates readiness and merges when labels and checks are both ready.
    #[instrument(skip(self))]
    pub async fn check_merge(&self) -> Result<MergeState, BrokerError> {
        let number = self.pull_request_number(EventKind::CheckMerge)?;
        self.evaluate_and_merge(number, None).await
    }

    /// Announces that CI finished by posting the recheck command.
    #[instrument(skip(self))]
    pub async fn tests_done(&self) -> Result<(), BrokerError> {
        let number = self.pull_request_number(EventKind::TestsDone)?;
        let body = format!("/{}", RECHECK_COMMAND);
        self.create_comment(number, body).await.map(|_| ())
    }

    // ─── Commands ─────────────────────────────────────────────────────────────

    /// Runs one slash command against the invocation's target, which is of
    /// the given kind.
    pub async fn dispatch(
        &self,
        kind: ChangeKind,
        command: &SlashCommand,
    ) -> Result<(), CommandError> {
        let number = self.invocation.target.number;
        match &command.handler {
            CommandHandler::ToggleLabel { label } => match command.label_action() {
                LabelAction::Add => self.add_label(number, label).await,
                LabelAction::Remove => self.remove_label(number, label).await,
            },
            CommandHandler::Recheck => {
                if kind == ChangeKind::PullRequest {
                    self.evaluate_and_merge(number, None).await?;
                } else {
                    info!(command = %command, "recheck on an issue, nothing to evaluate");
                }
                Ok(())
            }
            CommandHandler::Noop => {
                info!(command = %command, "no handler for command");
                Ok(())
            }
        }
    }

    /// Adds `label`, provided the repository defines it.
    async fn add_label(&self, number: IssueNumber, label: &str) -> Result<(), CommandError> {
        let defined = self.repo_labels().await?;
        if !defined.iter().any(|l| l == label) {
            return Err(CommandError::UnknownLabel {
                label: label.to_string(),
            });
        }

        let effect = GitHubEffect::AddLabel {
            number,
            label: label.to_string(),
        };
        self.call(effect).await?;
        info!(pr = %number, label, "label added");
        Ok(())
    }

    /// Removes `label`. Removing a label that is not applied succeeds.
    async fn remove_label(&self, number: IssueNumber, label: &str) -> Result<(), CommandError> {
        let effect = GitHubEffect::RemoveLabel {
            number,
            label: label.to_string(),
        };
        match self.call(effect).await {
            Ok(_) => info!(pr = %number, label, "label removed"),
            Err(e) if e.is_not_found() => debug!(pr = %number, label, "label was not applied"),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    // ─── Readiness and merge ──────────────────────────────────────────────────

    /// Evaluates readiness of `number` and merges when ready.
    ///
    /// After a merge the status comments are deleted; `status_comment` skips
    /// the lookup when the caller already knows the one to remove.
    async fn evaluate_and_merge(
        &self,
        number: IssueNumber,
        status_comment: Option<CommentId>,
    ) -> Result<MergeState, BrokerError> {
        let pr = self.pull_request(number).await?;
        if pr.merged {
            info!(pr = %number, "already merged");
            return Ok(MergeState::Merged);
        }

        let runs = self.check_runs(&pr.head_sha).await?;
        let readiness = Readiness::evaluate(&self.config.required_labels, &pr, &runs);
        let state = readiness.state();
        info!(
            pr = %number,
            state = %state,
            missing_labels = ?readiness.labels.missing,
            mergeable = readiness.labels.mergeable,
            checks = ?readiness.checks,
            "evaluated readiness"
        );
        if state != MergeState::Ready {
            return Ok(state);
        }

        if let Err(e) = self.merge(&pr).await {
            error!(pr = %number, state = %MergeState::Blocked, error = %e, "merge failed");
            return Err(e);
        }

        let stale = match status_comment {
            Some(id) => vec![id],
            None => self.existing_status_comments(number).await?,
        };
        for id in stale {
            if let Err(e) = self.delete_comment(id).await {
                warn!(comment = %id, error = %e, "failed to delete status comment after merge");
            }
        }

        Ok(MergeState::Merged)
    }

    /// Merges `pr`. A pull request already reported merged is left alone.
    pub async fn merge(&self, pr: &PullRequestData) -> Result<(), BrokerError> {
        if pr.merged {
            info!(pr = %pr.number, "already merged, skipping merge");
            return Ok(());
        }

        let effect = GitHubEffect::MergePullRequest {
            number: pr.number,
            commit_title: format!("Merge pull request {} ({})", pr.number, pr.title),
            commit_message: MERGE_COMMIT_MESSAGE.to_string(),
        };
        let sha = expect_response!(effect.name(), self.call(effect).await?,
            GitHubResponse::Merged { sha } => sha)?;
        info!(pr = %pr.number, sha = %sha.short(), "merged");
        Ok(())
    }

    // ─── Status comment ───────────────────────────────────────────────────────

    /// Replaces the status comment of `number` with a freshly rendered one.
    ///
    /// Returns the posted body, or `None` when the pull request is already
    /// merged and no comment is posted.
    pub async fn regenerate_status_comment(
        &self,
        number: IssueNumber,
    ) -> Result<Option<String>, BrokerError> {
        let pr = self.pull_request(number).await?;
        if pr.merged {
            debug!(pr = %number, "merged, not posting a status comment");
            return Ok(None);
        }

        let unit = ChangeUnit::pull_request(number, self.changed_files(number).await?);
        let workspace = &self.invocation.workspace;
        let owners = self
            .owners
            .resolve_for_changed_files(workspace, &unit.changed_files)?;
        let aliases = self.owners.resolve_aliases(workspace)?;

        let comments = self.comments(number).await?;
        let bot = self.bot_login().await?;
        let ledger = ApprovalLedger::scan(&comments);
        let state = ApprovalState::new(ledger, pr.author);
        let report = StatusReport::build(&owners, &state, &aliases);
        let body = format_status_comment(&report);

        for existing in status_comments(&comments, &bot) {
            match self.delete_comment(existing.id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    debug!(comment = %existing.id, "status comment already gone")
                }
                Err(e) => return Err(e),
            }
        }

        let id = self.create_comment(number, body.clone()).await?;
        info!(
            pr = %number,
            comment = %id,
            approved = report.is_approved(),
            pending_files = report.unsatisfied().count(),
            "posted status comment"
        );
        Ok(Some(body))
    }

    async fn existing_status_comments(
        &self,
        number: IssueNumber,
    ) -> Result<Vec<CommentId>, BrokerError> {
        let comments = self.comments(number).await?;
        let bot = self.bot_login().await?;
        Ok(status_comments(&comments, &bot).map(|c| c.id).collect())
    }

    // ─── Transport ────────────────────────────────────────────────────────────

    /// Kind of the invocation's target as GitHub sees it.
    ///
    /// Comments on pull requests arrive as issue comments, so an issue
    /// target is looked up and promoted when it is really a pull request.
    async fn change_kind(&self) -> Result<ChangeKind, BrokerError> {
        let target = self.invocation.target;
        if target.kind == ChangeKind::PullRequest {
            return Ok(ChangeKind::PullRequest);
        }
        let issue = self.issue(target.number).await?;
        if issue.is_pull_request {
            debug!(number = %target.number, "issue target is a pull request");
            return Ok(ChangeKind::PullRequest);
        }
        Ok(ChangeKind::Issue)
    }

    fn pull_request_number(&self, event: EventKind) -> Result<IssueNumber, BrokerError> {
        match self.invocation.target.kind {
            ChangeKind::PullRequest => Ok(self.invocation.target.number),
            ChangeKind::Issue => Err(ContextError::MissingPullRequest { event }.into()),
        }
    }

    /// Executes an effect, racing it against cancellation.
    async fn call(&self, effect: GitHubEffect) -> Result<GitHubResponse, BrokerError> {
        if self.cancel.is_cancelled() {
            debug!("cancellation detected before effect execution");
            return Err(BrokerError::Cancelled);
        }

        let operation = effect.name();
        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => {
                debug!(operation, "effect cancelled");
                Err(BrokerError::Cancelled)
            }
            result = self.github.interpret(effect) => {
                result.map_err(|e| {
                    if e.is_not_found() {
                        BrokerError::NotFound { operation, source: Box::new(e) }
                    } else {
                        BrokerError::Transport { operation, source: Box::new(e) }
                    }
                })
            }
        }
    }

    async fn pull_request(&self, number: IssueNumber) -> Result<PullRequestData, BrokerError> {
        let effect = GitHubEffect::GetPullRequest { number };
        expect_response!(effect.name(), self.call(effect).await?,
            GitHubResponse::PullRequest(pr) => pr)
    }

    async fn issue(&self, number: IssueNumber) -> Result<IssueData, BrokerError> {
        let effect = GitHubEffect::GetIssue { number };
        expect_response!(effect.name(), self.call(effect).await?,
            GitHubResponse::Issue(issue) => issue)
    }

    async fn comment(&self, comment_id: CommentId) -> Result<CommentData, BrokerError> {
        let effect = GitHubEffect::GetComment { comment_id };
        expect_response!(effect.name(), self.call(effect).await?,
            GitHubResponse::Comment(comment) => comment)
    }

    async fn comments(&self, number: IssueNumber) -> Result<Vec<CommentData>, BrokerError> {
        let effect = GitHubEffect::ListComments { number };
        expect_response!(effect.name(), self.call(effect).await?,
            GitHubResponse::Comments(comments) => comments)
    }

    async fn changed_files(&self, number: IssueNumber) -> Result<Vec<String>, BrokerError> {
        let effect = GitHubEffect::ListChangedFiles { number };
        expect_response!(effect.name(), self.call(effect).await?,
            GitHubResponse::ChangedFiles(files) => files)
    }

    async fn repo_labels(&self) -> Result<Vec<String>, BrokerError> {
        let effect = GitHubEffect::ListRepoLabels;
        expect_response!(effect.name(), self.call(effect).await?,
            GitHubResponse::Labels(labels) => labels)
    }

    async fn check_runs(&self, sha: &Sha) -> Result<Vec<CheckRunData>, BrokerError> {
        let effect = GitHubEffect::ListCheckRuns { sha: sha.clone() };
        expect_response!(effect.name(), self.call(effect).await?,
            GitHubResponse::CheckRuns(runs) => runs)
    }

    async fn bot_login(&self) -> Result<String, BrokerError> {
        let effect = GitHubEffect::GetAuthenticatedUser;
        expect_response!(effect.name(), self.call(effect).await?,
            GitHubResponse::User { login } => login)
    }

    async fn create_comment(
        &self,
        number: IssueNumber,
        body: String,
    ) -> Result<CommentId, BrokerError> {
        let effect = GitHubEffect::CreateComment { number, body };
        expect_response!(effect.name(), self.call(effect).await?,
            GitHubResponse::CommentCreated { id } => id)
    }

    async fn delete_comment(&self, comment_id: CommentId) -> Result<(), BrokerError> {
        let effect = GitHubEffect::DeleteComment { comment_id };
        expect_response!(effect.name(), self.call(effect).await?,
            GitHubResponse::CommentDeleted => ())
    }
}
