//! GitHub effect interpreter using octocrab.
//!
//! Implements `GitHubInterpreter` for `OctocrabClient`. Most calls go through
//! the REST routes directly and deserialize only the fields the broker reads;
//! the comment and label mutations use octocrab's typed issue handlers.
//! Every list operation pages through results 100 at a time.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::effects::{
    CheckRunData, CommentData, GitHubEffect, GitHubInterpreter, GitHubResponse, IssueData,
    PullRequestData,
};
use crate::types::{CommentId, IssueNumber, Sha};

use super::client::OctocrabClient;
use super::error::GitHubApiError;
use super::retry::{RetryConfig, RetryPolicy, retry_with_backoff};

/// GitHub's maximum page size.
const PER_PAGE: u8 = 100;

/// Merge strategy used for approved pull requests.
const MERGE_METHOD: &str = "merge";

// ─── Interpreter Implementation ───────────────────────────────────────────────

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        interpret_github_effect(self, effect, self.retry_config(), RetryPolicy::RetryTransient)
            .await
    }
}

/// Executes `effect` against the API, retrying transient failures.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
    retry_config: RetryConfig,
    retry_policy: RetryPolicy,
) -> Result<GitHubResponse, GitHubApiError> {
    trace!(effect = effect.name(), "interpreting GitHub effect");
    retry_with_backoff(retry_config, retry_policy, || {
        execute_effect(client, effect.clone())
    })
    .await
    .into_result()
}

/// Executes a single effect without retry logic.
async fn execute_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::GetPullRequest { number } => get_pull_request(client, number).await,
        GitHubEffect::GetIssue { number } => get_issue(client, number).await,
        GitHubEffect::GetComment { comment_id } => get_comment(client, comment_id).await,
        GitHubEffect::ListComments { number } => list_comments(client, number).await,
        GitHubEffect::ListChangedFiles { number } => list_changed_files(client, number).await,
        GitHubEffect::ListRepoLabels => list_repo_labels(client).await,
        GitHubEffect::ListCheckRuns { sha } => list_check_runs(client, sha).await,
        GitHubEffect::GetAuthenticatedUser => get_authenticated_user(client).await,
        GitHubEffect::CreateComment { number, body } => create_comment(client, number, body).await,
        GitHubEffect::DeleteComment { comment_id } => delete_comment(client, comment_id).await,
        GitHubEffect::AddLabel { number, label } => add_label(client, number, label).await,
        GitHubEffect::RemoveLabel { number, label } => remove_label(client, number, label).await,
        GitHubEffect::MergePullRequest {
            number,
            commit_title,
            commit_message,
        } => merge_pull_request(client, number, commit_title, commit_message).await,
    }
}

// ─── REST Payloads ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PageQuery {
    per_page: u8,
    page: u32,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    login: String,
}

#[derive(Debug, Deserialize)]
struct LabelPayload {
    name: String,
}

#[derive(Debug, Deserialize)]
struct HeadPayload {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullPayload {
    number: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    user: Option<UserPayload>,
    head: HeadPayload,
    #[serde(default)]
    labels: Vec<LabelPayload>,
    #[serde(default)]
    merged: bool,
    #[serde(default)]
    mergeable: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    user: Option<UserPayload>,
    #[serde(default)]
    labels: Vec<LabelPayload>,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CommentPayload {
    id: u64,
    #[serde(default)]
    user: Option<UserPayload>,
    #[serde(default)]
    body: Option<String>,
}

impl From<CommentPayload> for CommentData {
    fn from(payload: CommentPayload) -> Self {
        CommentData {
            id: CommentId(payload.id),
            author: login_of(payload.user),
            body: payload.body.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChangedFilePayload {
    filename: String,
}

#[derive(Debug, Deserialize)]
struct CheckRunPayload {
    name: String,
    status: String,
    #[serde(default)]
    conclusion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckRunsPage {
    check_runs: Vec<CheckRunPayload>,
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    sha: String,
    merged: bool,
    message: Option<String>,
}

fn login_of(user: Option<UserPayload>) -> String {
    user.map(|u| u.login).unwrap_or_default()
}

fn label_names(labels: Vec<LabelPayload>) -> Vec<String> {
    labels.into_iter().map(|l| l.name).collect()
}

/// Fetches every page of a list route.
///
/// `extract` turns one page's payload into items. Paging stops at the first
/// page shorter than `PER_PAGE`.
async fn get_all_pages<P, T>(
    client: &OctocrabClient,
    route: &str,
    extract: impl Fn(P) -> Vec<T>,
) -> Result<Vec<T>, GitHubApiError>
where
    P: serde::de::DeserializeOwned,
{
    let mut page = 1u32;
    let mut all_items = Vec::new();

    loop {
        let query = PageQuery {
            per_page: PER_PAGE,
            page,
        };
        let payload: P = client
            .inner()
            .get(route, Some(&query))
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let items = extract(payload);
        let is_last_page = items.len() < usize::from(PER_PAGE);
        all_items.extend(items);

        if is_last_page {
            break;
        }
        page += 1;
    }

    Ok(all_items)
}

// ─── Queries ──────────────────────────────────────────────────────────────────

async fn get_pull_request(
    client: &OctocrabClient,
    number: IssueNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("{}/pulls/{}", client.repo_route(), number.0);
    let pull: PullPayload = client
        .inner()
        .get(&url, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::PullRequest(PullRequestData {
        number: IssueNumber(pull.number),
        title: pull.title.unwrap_or_default(),
        author: login_of(pull.user),
        head_sha: Sha::new(pull.head.sha),
        labels: label_names(pull.labels),
        merged: pull.merged,
        mergeable: pull.mergeable,
    }))
}

async fn get_issue(
    client: &OctocrabClient,
    number: IssueNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("{}/issues/{}", client.repo_route(), number.0);
    let issue: IssuePayload = client
        .inner()
        .get(&url, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Issue(IssueData {
        number: IssueNumber(issue.number),
        title: issue.title,
        author: login_of(issue.user),
        labels: label_names(issue.labels),
        is_pull_request: issue.pull_request.is_some(),
    }))
}

async fn get_comment(
    client: &OctocrabClient,
    comment_id: CommentId,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("{}/issues/comments/{}", client.repo_route(), comment_id.0);
    let comment: CommentPayload = client
        .inner()
        .get(&url, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::Comment(comment.into()))
}

async fn list_comments(
    client: &OctocrabClient,
    number: IssueNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("{}/issues/{}/comments", client.repo_route(), number.0);
    let comments = get_all_pages(client, &url, |page: Vec<CommentPayload>| {
        page.into_iter().map(CommentData::from).collect()
    })
    .await?;

    Ok(GitHubResponse::Comments(comments))
}

async fn list_changed_files(
    client: &OctocrabClient,
    number: IssueNumber,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("{}/pulls/{}/files", client.repo_route(), number.0);
    let files = get_all_pages(client, &url, |page: Vec<ChangedFilePayload>| {
        page.into_iter().map(|f| f.filename).collect()
    })
    .await?;

    Ok(GitHubResponse::ChangedFiles(files))
}

async fn list_repo_labels(client: &OctocrabClient) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("{}/labels", client.repo_route());
    let labels = get_all_pages(client, &url, label_names).await?;

    Ok(GitHubResponse::Labels(labels))
}

async fn list_check_runs(
    client: &OctocrabClient,
    sha: Sha,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!(
        "{}/commits/{}/check-runs",
        client.repo_route(),
        sha.as_str()
    );
    let runs = get_all_pages(client, &url, |page: CheckRunsPage| {
        page.check_runs
            .into_iter()
            .map(|run| CheckRunData {
                name: run.name,
                status: run.status,
                conclusion: run.conclusion,
            })
            .collect()
    })
    .await?;

    Ok(GitHubResponse::CheckRuns(runs))
}

async fn get_authenticated_user(
    client: &OctocrabClient,
) -> Result<GitHubResponse, GitHubApiError> {
    let user = client
        .inner()
        .current()
        .user()
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::User { login: user.login })
}

// ─── Mutations ────────────────────────────────────────────────────────────────

async fn create_comment(
    client: &OctocrabClient,
    number: IssueNumber,
    body: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let comment = client
        .inner()
        .issues(client.owner(), client.repo_name())
        .create_comment(number.0, body)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::CommentCreated {
        id: CommentId(comment.id.into_inner()),
    })
}

async fn delete_comment(
    client: &OctocrabClient,
    comment_id: CommentId,
) -> Result<GitHubResponse, GitHubApiError> {
    client
        .inner()
        .issues(client.owner(), client.repo_name())
        .delete_comment(octocrab::models::CommentId(comment_id.0))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::CommentDeleted)
}

async fn add_label(
    client: &OctocrabClient,
    number: IssueNumber,
    label: String,
) -> Result<GitHubResponse, GitHubApiError> {
    client
        .inner()
        .issues(client.owner(), client.repo_name())
        .add_labels(number.0, &[label])
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::LabelAdded)
}

async fn remove_label(
    client: &OctocrabClient,
    number: IssueNumber,
    label: String,
) -> Result<GitHubResponse, GitHubApiError> {
    client
        .inner()
        .issues(client.owner(), client.repo_name())
        .remove_label(number.0, &label)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    Ok(GitHubResponse::LabelRemoved)
}

async fn merge_pull_request(
    client: &OctocrabClient,
    number: IssueNumber,
    commit_title: String,
    commit_message: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("{}/pulls/{}/merge", client.repo_route(), number.0);

    #[derive(Serialize)]
    struct MergeRequest {
        merge_method: &'static str,
        commit_title: String,
        commit_message: String,
    }

    let request = MergeRequest {
        merge_method: MERGE_METHOD,
        commit_title,
        commit_message,
    };

    let response: MergeResponse = client
        .inner()
        .put(&url, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    if response.merged {
        Ok(GitHubResponse::Merged {
            sha: Sha::new(response.sha),
        })
    } else {
        Err(GitHubApiError::permanent_without_source(format!(
            "merge of {} returned merged=false: {}",
            number,
            response.message.as_deref().unwrap_or("unknown reason")
        )))
    }
}
