//! Trait definitions for the GitHub REST operations the steps depend on

use crate::error::Result;
use crate::types::{
    BranchProtection, Comment, Issue, IssueUpdate, Milestone, PullRequest, Release, Review,
    WorkflowRun,
};
use std::future::Future;

/// GitHub REST operations, scoped to the current repository.
///
/// Every step is generic over this trait: the reqwest client implements it
/// for real runs, tests substitute an in-memory repository. Static dispatch
/// only; no boxing of futures.
///
/// Listing methods return a single page of at most
/// [`PAGE_SIZE`](crate::http::PAGE_SIZE) items.
pub trait GitHubApi: Send + Sync {
    /// `GET /repos/{owner}/{repo}/releases/tags/{tag}`
    fn get_release_by_tag(&self, tag: &str) -> impl Future<Output = Result<Release>> + Send;

    /// `GET /repos/{owner}/{repo}/releases`
    fn list_releases(&self) -> impl Future<Output = Result<Vec<Release>>> + Send;

    /// `PATCH /repos/{owner}/{repo}/releases/{id}` with a new body
    fn update_release_body(
        &self,
        release_id: u64,
        body: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// `GET /repos/{owner}/{repo}/pulls?state=all`
    fn list_pulls(&self) -> impl Future<Output = Result<Vec<PullRequest>>> + Send;

    /// `POST /repos/{owner}/{repo}/pulls`, converting an issue into a pull request
    fn create_pull_from_issue(
        &self,
        head: &str,
        base: &str,
        issue_number: u64,
    ) -> impl Future<Output = Result<PullRequest>> + Send;

    /// `GET /repos/{owner}/{repo}/pulls/{number}/reviews`
    fn list_reviews(&self, pull_number: u64) -> impl Future<Output = Result<Vec<Review>>> + Send;

    /// `POST /repos/{owner}/{repo}/pulls/{number}/requested_reviewers`
    fn request_reviewers(
        &self,
        pull_number: u64,
        reviewers: &[String],
    ) -> impl Future<Output = Result<()>> + Send;

    /// `PUT /repos/{owner}/{repo}/branches/{branch}/protection`
    fn update_branch_protection(
        &self,
        branch: &str,
        protection: &BranchProtection,
    ) -> impl Future<Output = Result<()>> + Send;

    /// `GET /repos/{owner}/{repo}/issues?state=all` (includes pull requests)
    fn list_issues(&self) -> impl Future<Output = Result<Vec<Issue>>> + Send;

    /// `PATCH /repos/{owner}/{repo}/issues/{number}`
    fn update_issue(
        &self,
        issue_number: u64,
        update: &IssueUpdate,
    ) -> impl Future<Output = Result<()>> + Send;

    /// `POST /repos/{owner}/{repo}/issues/{number}/labels`
    fn add_labels(
        &self,
        issue_number: u64,
        labels: &[String],
    ) -> impl Future<Output = Result<()>> + Send;

    /// `DELETE /repos/{owner}/{repo}/issues/{number}/labels/{name}`
    fn remove_label(&self, issue_number: u64, name: &str)
        -> impl Future<Output = Result<()>> + Send;

    /// `DELETE /repos/{owner}/{repo}/issues/{number}/assignees`
    fn remove_assignees(
        &self,
        issue_number: u64,
        assignees: &[String],
    ) -> impl Future<Output = Result<()>> + Send;

    /// `POST /repos/{owner}/{repo}/issues/{number}/comments`
    fn create_comment(
        &self,
        issue_number: u64,
        body: &str,
    ) -> impl Future<Output = Result<Comment>> + Send;

    /// `PATCH /repos/{owner}/{repo}/issues/comments/{id}`
    fn update_comment(&self, comment_id: u64, body: &str)
        -> impl Future<Output = Result<()>> + Send;

    /// `GET /repos/{owner}/{repo}/milestones`
    fn list_milestones(&self) -> impl Future<Output = Result<Vec<Milestone>>> + Send;

    /// `POST /repos/{owner}/{repo}/milestones`
    fn create_milestone(&self, title: &str) -> impl Future<Output = Result<Milestone>> + Send;

    /// `GET /repos/{owner}/{repo}/actions/workflows/{file}/runs`
    fn list_workflow_runs(
        &self,
        workflow_file: &str,
    ) -> impl Future<Output = Result<Vec<WorkflowRun>>> + Send;
}
