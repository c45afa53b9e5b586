//! Shared test fixtures: an in-memory GitHub and builders for API data.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use crate::effects::{
    CheckRunData, CommentData, GitHubEffect, GitHubInterpreter, GitHubResponse, InterpreterError,
    IssueData, PullRequestData,
};
use crate::types::{CommentId, IssueNumber, Sha};

pub fn pull_request(number: u64, author: &str, labels: &[&str]) -> PullRequestData {
    PullRequestData {
        number: IssueNumber(number),
        title: format!("Change {}", number),
        author: author.to_string(),
        head_sha: Sha::new(format!("{:040x}", number)),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        merged: false,
        mergeable: Some(true),
    }
}

pub fn check_run(name: &str, status: &str, conclusion: Option<&str>) -> CheckRunData {
    CheckRunData {
        name: name.to_string(),
        status: status.to_string(),
        conclusion: conclusion.map(str::to_string),
    }
}

/// Error returned by [`MockGitHub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockError {
    pub message: String,
    pub not_found: bool,
}

impl MockError {
    pub fn not_found(what: impl Into<String>) -> Self {
        MockError {
            message: what.into(),
            not_found: true,
        }
    }

    pub fn server(what: impl Into<String>) -> Self {
        MockError {
            message: what.into(),
            not_found: false,
        }
    }
}

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.not_found {
            write!(f, "not found: {}", self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for MockError {}

impl InterpreterError for MockError {
    fn is_not_found(&self) -> bool {
        self.not_found
    }
}

#[derive(Debug, Default)]
struct MockState {
    pull_requests: BTreeMap<IssueNumber, PullRequestData>,
    issues: BTreeMap<IssueNumber, IssueData>,
    comments: BTreeMap<IssueNumber, Vec<CommentData>>,
    changed_files: BTreeMap<IssueNumber, Vec<String>>,
    repo_labels: Vec<String>,
    check_runs: HashMap<Sha, Vec<CheckRunData>>,
    bot_login: String,
    next_comment_id: u64,
    failures: HashMap<&'static str, MockError>,
    log: Vec<GitHubEffect>,
}

/// An in-memory repository that answers effects the way GitHub would.
///
/// Mutations are applied to the stored data, so a later query observes
/// them. Every effect is recorded in order.
#[derive(Debug)]
pub struct MockGitHub {
    state: Mutex<MockState>,
    delay: Option<Duration>,
}

impl MockGitHub {
    pub fn new(bot_login: &str) -> Self {
        MockGitHub {
            state: Mutex::new(MockState {
                bot_login: bot_login.to_string(),
                repo_labels: vec!["approved".to_string(), "lgtm".to_string()],
                next_comment_id: 1000,
                ..MockState::default()
            }),
            delay: None,
        }
    }

    /// Sleeps before answering each effect.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_pull_request(self, pr: PullRequestData, files: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.changed_files.insert(
                pr.number,
                files.iter().map(|f| f.to_string()).collect(),
            );
            state.pull_requests.insert(pr.number, pr);
        }
        self
    }

    pub fn with_issue(self, number: u64, author: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.issues.insert(
                IssueNumber(number),
                IssueData {
                    number: IssueNumber(number),
                    title: format!("Issue {}", number),
                    author: author.to_string(),
                    labels: Vec::new(),
                    is_pull_request: false,
                },
            );
        }
        self
    }

    pub fn with_repo_labels(self, labels: &[&str]) -> Self {
        self.state.lock().unwrap().repo_labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_check_runs(self, sha: &Sha, runs: Vec<CheckRunData>) -> Self {
        self.state
            .lock()
            .unwrap()
            .check_runs
            .insert(sha.clone(), runs);
        self
    }

    /// Makes every effect named `effect` fail with `error`.
    pub fn failing(self, effect: &'static str, error: MockError) -> Self {
        self.state.lock().unwrap().failures.insert(effect, error);
        self
    }

    /// Stores a comment on `number` and returns its ID.
    pub fn add_comment(&self, number: u64, author: &str, body: &str) -> CommentId {
        let mut state = self.state.lock().unwrap();
        let id = CommentId(state.next_comment_id);
        state.next_comment_id += 1;
        state
            .comments
            .entry(IssueNumber(number))
            .or_default()
            .push(CommentData {
                id,
                author: author.to_string(),
                body: body.to_string(),
            });
        id
    }

    pub fn comments(&self, number: u64) -> Vec<CommentData> {
        self.state
            .lock()
            .unwrap()
            .comments
            .get(&IssueNumber(number))
            .cloned()
            .unwrap_or_default()
    }

    pub fn pull_request(&self, number: u64) -> PullRequestData {
        self.state.lock().unwrap().pull_requests[&IssueNumber(number)].clone()
    }

    pub fn issue_labels(&self, number: u64) -> Vec<String> {
        self.state.lock().unwrap().issues[&IssueNumber(number)]
            .labels
            .clone()
    }

    /// Every effect received so far, in order.
    pub fn log(&self) -> Vec<GitHubEffect> {
        self.state.lock().unwrap().log.clone()
    }

    /// Names of the mutating effects received so far.
    pub fn mutations(&self) -> Vec<&'static str> {
        self.log()
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    GitHubEffect::CreateComment { .. }
                        | GitHubEffect::DeleteComment { .. }
                        | GitHubEffect::AddLabel { .. }
                        | GitHubEffect::RemoveLabel { .. }
                        | GitHubEffect::MergePullRequest { .. }
                )
            })
            .map(GitHubEffect::name)
            .collect()
    }

    fn answer(&self, effect: GitHubEffect) -> Result<GitHubResponse, MockError> {
        let mut state = self.state.lock().unwrap();
        state.log.push(effect.clone());
        if let Some(err) = state.failures.get(effect.name()) {
            return Err(err.clone());
        }

        match effect {
            GitHubEffect::GetPullRequest { number } => state
                .pull_requests
                .get(&number)
                .cloned()
                .map(GitHubResponse::PullRequest)
                .ok_or_else(|| MockError::not_found(format!("pull request {}", number))),
            GitHubEffect::GetIssue { number } => {
                if let Some(pr) = state.pull_requests.get(&number) {
                    return Ok(GitHubResponse::Issue(IssueData {
                        number,
                        title: pr.title.clone(),
                        author: pr.author.clone(),
                        labels: pr.labels.clone(),
                        is_pull_request: true,
                    }));
                }
                state
                    .issues
                    .get(&number)
                    .cloned()
                    .map(GitHubResponse::Issue)
                    .ok_or_else(|| MockError::not_found(format!("issue {}", number)))
            }
            GitHubEffect::GetComment { comment_id } => state
                .comments
                .values()
                .flatten()
                .find(|c| c.id == comment_id)
                .cloned()
                .map(GitHubResponse::Comment)
                .ok_or_else(|| MockError::not_found(format!("comment {}", comment_id))),
            GitHubEffect::ListComments { number } => Ok(GitHubResponse::Comments(
                state.comments.get(&number).cloned().unwrap_or_default(),
            )),
            GitHubEffect::ListChangedFiles { number } => Ok(GitHubResponse::ChangedFiles(
                state.changed_files.get(&number).cloned().unwrap_or_default(),
            )),
            GitHubEffect::ListRepoLabels => Ok(GitHubResponse::Labels(state.repo_labels.clone())),
            GitHubEffect::ListCheckRuns { sha } => Ok(GitHubResponse::CheckRuns(
                state.check_runs.get(&sha).cloned().unwrap_or_default(),
            )),
            GitHubEffect::GetAuthenticatedUser => Ok(GitHubResponse::User {
                login: state.bot_login.clone(),
            }),
            GitHubEffect::CreateComment { number, body } => {
                let id = CommentId(state.next_comment_id);
                state.next_comment_id += 1;
                let author = state.bot_login.clone();
                state
                    .comments
                    .entry(number)
                    .or_default()
                    .push(CommentData { id, author, body });
                Ok(GitHubResponse::CommentCreated { id })
            }
            GitHubEffect::DeleteComment { comment_id } => {
                for comments in state.comments.values_mut() {
                    if let Some(pos) = comments.iter().position(|c| c.id == comment_id) {
                        comments.remove(pos);
                        return Ok(GitHubResponse::CommentDeleted);
                    }
                }
                Err(MockError::not_found(format!("comment {}", comment_id)))
            }
            GitHubEffect::AddLabel { number, label } => {
                let labels = labels_mut(&mut state, number)?;
                if !labels.contains(&label) {
                    labels.push(label);
                }
                Ok(GitHubResponse::LabelAdded)
            }
            GitHubEffect::RemoveLabel { number, label } => {
                let labels = labels_mut(&mut state, number)?;
                let pos = labels
                    .iter()
                    .position(|l| *l == label)
                    .ok_or_else(|| MockError::not_found(format!("label {}", label)))?;
                labels.remove(pos);
                Ok(GitHubResponse::LabelRemoved)
            }
            GitHubEffect::MergePullRequest { number, .. } => {
                let pr = state
                    .pull_requests
                    .get_mut(&number)
                    .ok_or_else(|| MockError::not_found(format!("pull request {}", number)))?;
                if pr.merged {
                    return Err(MockError::server("Pull Request is not mergeable"));
                }
                pr.merged = true;
                Ok(GitHubResponse::Merged {
                    sha: Sha::new("f".repeat(40)),
                })
            }
        }
    }
}

fn labels_mut(state: &mut MockState, number: IssueNumber) -> Result<&mut Vec<String>, MockError> {
    if let Some(pr) = state.pull_requests.get_mut(&number) {
        return Ok(&mut pr.labels);
    }
    state
        .issues
        .get_mut(&number)
        .map(|issue| &mut issue.labels)
        .ok_or_else(|| MockError::not_found(format!("issue {}", number)))
}

impl GitHubInterpreter for MockGitHub {
    type Error = MockError;

    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send {
        let delay = self.delay;
        let result = self.answer(effect);
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}
