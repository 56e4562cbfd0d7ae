//! GitHub REST API client backed by reqwest

use super::PAGE_SIZE;
use crate::context::Repository;
use crate::error::{Error, Result};
use crate::traits::GitHubApi;
use crate::types::{
    BranchProtection, Comment, Issue, IssueUpdate, Milestone, PullRequest, Release, Review,
    WorkflowRun,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct GitHubLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubIssue {
    number: u64,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
    /// Present only when the listing entry is a pull request
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GitHubPull {
    id: u64,
    number: u64,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
}

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    id: u64,
    tag_name: String,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubReview {
    /// Null for reviews by deleted accounts
    user: Option<GitHubUser>,
    state: String,
    submitted_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubMilestone {
    number: u64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct GitHubComment {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct WorkflowRunsResponse {
    #[allow(dead_code)]
    total_count: u32,
    workflow_runs: Vec<GitHubWorkflowRun>,
}

#[derive(Debug, Deserialize)]
struct GitHubWorkflowRun {
    id: u64,
    run_number: u64,
    status: Option<String>,
    head_branch: Option<String>,
    run_started_at: Option<String>,
}

fn label_names(labels: Vec<GitHubLabel>) -> Vec<String> {
    labels.into_iter().map(|l| l.name).collect()
}

fn convert_issue(issue: GitHubIssue) -> Issue {
    Issue {
        number: issue.number,
        labels: label_names(issue.labels),
        is_pull_request: issue.pull_request.is_some(),
    }
}

fn convert_pull(pull: GitHubPull) -> PullRequest {
    PullRequest {
        id: pull.id,
        number: pull.number,
        labels: label_names(pull.labels),
    }
}

fn convert_release(release: GitHubRelease) -> Release {
    Release {
        id: release.id,
        tag_name: release.tag_name,
        created_at: release.created_at,
    }
}

fn convert_review(review: GitHubReview) -> Review {
    Review {
        user: review.user.map(|u| u.login).unwrap_or_default(),
        state: review.state,
        submitted_at: review.submitted_at,
    }
}

fn convert_workflow_run(run: GitHubWorkflowRun) -> WorkflowRun {
    WorkflowRun {
        id: run.id,
        run_number: run.run_number,
        status: run.status.unwrap_or_default(),
        head_branch: run.head_branch.unwrap_or_default(),
        run_started_at: run.run_started_at,
    }
}

/// GitHub REST client bound to a single repository
#[derive(Clone)]
pub struct GitHubApiClient {
    client: reqwest::Client,
    base_url: String,
    repository: Repository,
    token: Option<String>,
}

impl std::fmt::Debug for GitHubApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubApiClient")
            .field("base_url", &self.base_url)
            .field("repository", &self.repository)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl GitHubApiClient {
    /// Create a new GitHub API client
    pub fn new(base_url: String, repository: Repository, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("gradeflow/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            repository,
            token,
        }
    }

    /// Create from `GITHUB_API_URL`, `GITHUB_REPOSITORY` and `GITHUB_TOKEN`
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("GITHUB_API_URL")
            .unwrap_or_else(|_| "https://api.github.com".to_string());
        let repository = Repository::from_env()?;
        let token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());

        Ok(Self::new(base_url, repository, token))
    }

    /// Repository this client is bound to
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.base_url, self.repository.owner, self.repository.name, path
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, self.repo_url(path))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        request
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Api(format!("Failed to {}: {}", action, e)))?;

        let status = response.status();

        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            let remaining = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");

            if remaining == "0" {
                return Err(Error::RateLimitExceeded(format!(
                    "GitHub API rate limit exceeded while trying to {}.",
                    action
                )));
            }
        }

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!(
                "GitHub API returned 404 while trying to {}",
                action
            )));
        }

        if !status.is_success() {
            return Err(Error::Api(format!(
                "GitHub API returned {} while trying to {}",
                status, action
            )));
        }

        Ok(response)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder, action: &str) -> Result<T> {
        self.send(request, action)
            .await?
            .json()
            .await
            .map_err(|e| Error::Api(format!("Failed to parse response to {}: {}", action, e)))
    }

    fn page(&self, request: RequestBuilder) -> RequestBuilder {
        request.query(&[("per_page", PAGE_SIZE.to_string())])
    }
}

impl GitHubApi for GitHubApiClient {
    async fn get_release_by_tag(&self, tag: &str) -> Result<Release> {
        let request = self.request(Method::GET, &format!("/releases/tags/{}", tag));
        let release: GitHubRelease = self
            .json(request, &format!("fetch release {}", tag))
            .await?;
        Ok(convert_release(release))
    }

    async fn list_releases(&self) -> Result<Vec<Release>> {
        let request = self.page(self.request(Method::GET, "/releases"));
        let releases: Vec<GitHubRelease> = self.json(request, "list releases").await?;
        Ok(releases.into_iter().map(convert_release).collect())
    }

    async fn update_release_body(&self, release_id: u64, body: &str) -> Result<()> {
        let request = self
            .request(Method::PATCH, &format!("/releases/{}", release_id))
            .json(&json!({ "body": body }));
        self.send(request, &format!("update release {}", release_id))
            .await?;
        Ok(())
    }

    async fn list_pulls(&self) -> Result<Vec<PullRequest>> {
        let request = self
            .page(self.request(Method::GET, "/pulls"))
            .query(&[("state", "all")]);
        let pulls: Vec<GitHubPull> = self.json(request, "list pull requests").await?;
        Ok(pulls.into_iter().map(convert_pull).collect())
    }

    async fn create_pull_from_issue(
        &self,
        head: &str,
        base: &str,
        issue_number: u64,
    ) -> Result<PullRequest> {
        let request = self.request(Method::POST, "/pulls").json(&json!({
            "head": head,
            "base": base,
            "issue": issue_number,
        }));
        let pull: GitHubPull = self
            .json(request, &format!("create pull request from {}", head))
            .await?;
        Ok(convert_pull(pull))
    }

    async fn list_reviews(&self, pull_number: u64) -> Result<Vec<Review>> {
        let request = self.page(
            self.request(Method::GET, &format!("/pulls/{}/reviews", pull_number)),
        );
        let reviews: Vec<GitHubReview> = self
            .json(
                request,
                &format!("list reviews of pull request #{}", pull_number),
            )
            .await?;
        Ok(reviews.into_iter().map(convert_review).collect())
    }

    async fn request_reviewers(&self, pull_number: u64, reviewers: &[String]) -> Result<()> {
        let request = self
            .request(
                Method::POST,
                &format!("/pulls/{}/requested_reviewers", pull_number),
            )
            .json(&json!({ "reviewers": reviewers }));
        self.send(
            request,
            &format!("request reviewers on pull request #{}", pull_number),
        )
        .await?;
        Ok(())
    }

    async fn update_branch_protection(
        &self,
        branch: &str,
        protection: &BranchProtection,
    ) -> Result<()> {
        let request = self
            .request(Method::PUT, &format!("/branches/{}/protection", branch))
            .json(&json!({
                "required_status_checks": null,
                "enforce_admins": null,
                "required_pull_request_reviews": {
                    "required_approving_review_count": protection.required_approving_review_count,
                    "bypass_pull_request_allowances": {
                        "users": protection.bypass_users,
                    },
                },
                "restrictions": null,
                "allow_deletions": protection.allow_deletions,
            }));
        self.send(request, &format!("protect branch {}", branch))
            .await?;
        Ok(())
    }

    async fn list_issues(&self) -> Result<Vec<Issue>> {
        let request = self
            .page(self.request(Method::GET, "/issues"))
            .query(&[("state", "all")]);
        let issues: Vec<GitHubIssue> = self.json(request, "list issues").await?;
        Ok(issues.into_iter().map(convert_issue).collect())
    }

    async fn update_issue(&self, issue_number: u64, update: &IssueUpdate) -> Result<()> {
        let request = self
            .request(Method::PATCH, &format!("/issues/{}", issue_number))
            .json(update);
        self.send(request, &format!("update issue #{}", issue_number))
            .await?;
        Ok(())
    }

    async fn add_labels(&self, issue_number: u64, labels: &[String]) -> Result<()> {
        let request = self
            .request(Method::POST, &format!("/issues/{}/labels", issue_number))
            .json(&json!({ "labels": labels }));
        self.send(request, &format!("label issue #{}", issue_number))
            .await?;
        Ok(())
    }

    async fn remove_label(&self, issue_number: u64, name: &str) -> Result<()> {
        let request = self.request(
            Method::DELETE,
            &format!(
                "/issues/{}/labels/{}",
                issue_number,
                urlencoding::encode(name)
            ),
        );
        self.send(
            request,
            &format!("remove label {} from issue #{}", name, issue_number),
        )
        .await?;
        Ok(())
    }

    async fn remove_assignees(&self, issue_number: u64, assignees: &[String]) -> Result<()> {
        let request = self
            .request(Method::DELETE, &format!("/issues/{}/assignees", issue_number))
            .json(&json!({ "assignees": assignees }));
        self.send(
            request,
            &format!("remove assignees from issue #{}", issue_number),
        )
        .await?;
        Ok(())
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<Comment> {
        let request = self
            .request(Method::POST, &format!("/issues/{}/comments", issue_number))
            .json(&json!({ "body": body }));
        let comment: GitHubComment = self
            .json(request, &format!("comment on issue #{}", issue_number))
            .await?;
        Ok(Comment { id: comment.id })
    }

    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        let request = self
            .request(Method::PATCH, &format!("/issues/comments/{}", comment_id))
            .json(&json!({ "body": body }));
        self.send(request, &format!("update comment {}", comment_id))
            .await?;
        Ok(())
    }

    async fn list_milestones(&self) -> Result<Vec<Milestone>> {
        let request = self.page(self.request(Method::GET, "/milestones"));
        let milestones: Vec<GitHubMilestone> = self.json(request, "list milestones").await?;
        Ok(milestones
            .into_iter()
            .map(|m| Milestone {
                number: m.number,
                title: m.title,
            })
            .collect())
    }

    async fn create_milestone(&self, title: &str) -> Result<Milestone> {
        let request = self
            .request(Method::POST, "/milestones")
            .json(&json!({ "title": title }));
        let milestone: GitHubMilestone = self
            .json(request, &format!("create milestone {}", title))
            .await?;
        Ok(Milestone {
            number: milestone.number,
            title: milestone.title,
        })
    }

    async fn list_workflow_runs(&self, workflow_file: &str) -> Result<Vec<WorkflowRun>> {
        let request = self.page(self.request(
            Method::GET,
            &format!("/actions/workflows/{}/runs", workflow_file),
        ));
        let response: WorkflowRunsResponse = self
            .json(request, &format!("list {} runs", workflow_file))
            .await?;
        Ok(response
            .workflow_runs
            .into_iter()
            .map(convert_workflow_run)
            .collect())
    }
}
