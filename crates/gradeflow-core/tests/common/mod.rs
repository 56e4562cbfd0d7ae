//! In-memory GitHub repository shared by the integration tests

#![allow(dead_code)]

use gradeflow_core::context::{EventPayload, Repository, RunContext};
use gradeflow_core::error::{Error, Result};
use gradeflow_core::types::{
    BranchProtection, Comment, Issue, IssueUpdate, Milestone, PullRequest, Release, Review,
    WorkflowRun,
};
use gradeflow_core::GitHubApi;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A write the steps made against the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    UpdateReleaseBody { id: u64, body: String },
    CreatePull { head: String, base: String, issue: u64 },
    RequestReviewers { pull: u64, reviewers: Vec<String> },
    Protect { branch: String, protection: BranchProtection },
    UpdateIssue { number: u64, update: IssueUpdate },
    AddLabels { number: u64, labels: Vec<String> },
    RemoveLabel { number: u64, name: String },
    RemoveAssignees { number: u64, assignees: Vec<String> },
    CreateComment { number: u64, body: String },
    UpdateComment { id: u64, body: String },
    CreateMilestone { title: String },
}

#[derive(Default)]
pub struct State {
    pub releases: Vec<Release>,
    pub pulls: Vec<PullRequest>,
    pub issues: Vec<Issue>,
    pub reviews: HashMap<u64, Vec<Review>>,
    pub milestones: Vec<Milestone>,
    pub runs: Vec<WorkflowRun>,
    pub calls: Vec<Call>,
    /// Operation names that fail with an API error
    pub failing: HashSet<&'static str>,
    next_id: u64,
}

/// Clonable handle; clones share state
#[derive(Clone, Default)]
pub struct FakeGitHub {
    state: Arc<Mutex<State>>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F: FnOnce(&mut State)>(self, f: F) -> Self {
        f(&mut self.state.lock());
        self
    }

    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().failing.insert(operation);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        if self.state.lock().failing.contains(operation) {
            return Err(Error::Api(format!("{} failed (HTTP 500)", operation)));
        }
        Ok(())
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }

    fn next_id(&self) -> u64 {
        let mut state = self.state.lock();
        state.next_id += 1;
        1000 + state.next_id
    }
}

impl GitHubApi for FakeGitHub {
    async fn get_release_by_tag(&self, tag: &str) -> Result<Release> {
        self.check("get_release_by_tag")?;
        self.state
            .lock()
            .releases
            .iter()
            .find(|r| r.tag_name == tag)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("release {}", tag)))
    }

    async fn list_releases(&self) -> Result<Vec<Release>> {
        self.check("list_releases")?;
        Ok(self.state.lock().releases.clone())
    }

    async fn update_release_body(&self, release_id: u64, body: &str) -> Result<()> {
        self.check("update_release_body")?;
        self.record(Call::UpdateReleaseBody {
            id: release_id,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn list_pulls(&self) -> Result<Vec<PullRequest>> {
        self.check("list_pulls")?;
        Ok(self.state.lock().pulls.clone())
    }

    async fn create_pull_from_issue(
        &self,
        head: &str,
        base: &str,
        issue_number: u64,
    ) -> Result<PullRequest> {
        self.check("create_pull_from_issue")?;
        self.record(Call::CreatePull {
            head: head.to_string(),
            base: base.to_string(),
            issue: issue_number,
        });
        Ok(PullRequest {
            id: self.next_id(),
            number: issue_number,
            labels: Vec::new(),
        })
    }

    async fn list_reviews(&self, pull_number: u64) -> Result<Vec<Review>> {
        self.check("list_reviews")?;
        Ok(self
            .state
            .lock()
            .reviews
            .get(&pull_number)
            .cloned()
            .unwrap_or_default())
    }

    async fn request_reviewers(&self, pull_number: u64, reviewers: &[String]) -> Result<()> {
        self.check("request_reviewers")?;
        self.record(Call::RequestReviewers {
            pull: pull_number,
            reviewers: reviewers.to_vec(),
        });
        Ok(())
    }

    async fn update_branch_protection(
        &self,
        branch: &str,
        protection: &BranchProtection,
    ) -> Result<()> {
        self.check("update_branch_protection")?;
        self.record(Call::Protect {
            branch: branch.to_string(),
            protection: protection.clone(),
        });
        Ok(())
    }

    async fn list_issues(&self) -> Result<Vec<Issue>> {
        self.check("list_issues")?;
        Ok(self.state.lock().issues.clone())
    }

    async fn update_issue(&self, issue_number: u64, update: &IssueUpdate) -> Result<()> {
        self.check("update_issue")?;
        self.record(Call::UpdateIssue {
            number: issue_number,
            update: update.clone(),
        });
        Ok(())
    }

    async fn add_labels(&self, issue_number: u64, labels: &[String]) -> Result<()> {
        self.check("add_labels")?;
        self.record(Call::AddLabels {
            number: issue_number,
            labels: labels.to_vec(),
        });
        Ok(())
    }

    async fn remove_label(&self, issue_number: u64, name: &str) -> Result<()> {
        self.check("remove_label")?;
        self.record(Call::RemoveLabel {
            number: issue_number,
            name: name.to_string(),
        });
        Ok(())
    }

    async fn remove_assignees(&self, issue_number: u64, assignees: &[String]) -> Result<()> {
        self.check("remove_assignees")?;
        self.record(Call::RemoveAssignees {
            number: issue_number,
            assignees: assignees.to_vec(),
        });
        Ok(())
    }

    async fn create_comment(&self, issue_number: u64, body: &str) -> Result<Comment> {
        self.check("create_comment")?;
        self.record(Call::CreateComment {
            number: issue_number,
            body: body.to_string(),
        });
        Ok(Comment { id: self.next_id() })
    }

    async fn update_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        self.check("update_comment")?;
        self.record(Call::UpdateComment {
            id: comment_id,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn list_milestones(&self) -> Result<Vec<Milestone>> {
        self.check("list_milestones")?;
        Ok(self.state.lock().milestones.clone())
    }

    async fn create_milestone(&self, title: &str) -> Result<Milestone> {
        self.check("create_milestone")?;
        self.record(Call::CreateMilestone {
            title: title.to_string(),
        });
        let mut state = self.state.lock();
        let milestone = Milestone {
            number: state.milestones.len() as u64 + 1,
            title: title.to_string(),
        };
        state.milestones.push(milestone.clone());
        Ok(milestone)
    }

    async fn list_workflow_runs(&self, _workflow_file: &str) -> Result<Vec<WorkflowRun>> {
        self.check("list_workflow_runs")?;
        Ok(self.state.lock().runs.clone())
    }
}

pub fn release(id: u64, tag: &str) -> Release {
    Release {
        id,
        tag_name: tag.to_string(),
        created_at: Some("2024-02-01T18:30:00Z".to_string()),
    }
}

pub fn pull(id: u64, number: u64, labels: &[&str]) -> PullRequest {
    PullRequest {
        id,
        number,
        labels: labels.iter().map(|l| l.to_string()).collect(),
    }
}

pub fn issue(number: u64, labels: &[&str]) -> Issue {
    Issue {
        number,
        labels: labels.iter().map(|l| l.to_string()).collect(),
        is_pull_request: false,
    }
}

pub fn review_pull(number: u64, labels: &[&str]) -> Issue {
    Issue {
        is_pull_request: true,
        ..issue(number, labels)
    }
}

pub fn approval(user: &str, submitted_at: &str) -> Review {
    Review {
        user: user.to_string(),
        state: "APPROVED".to_string(),
        submitted_at: Some(submitted_at.to_string()),
    }
}

/// Run context for `usf-cs212/project-jdoe` with the given event
pub fn run_context(event_name: &str, actor: &str, event: serde_json::Value) -> RunContext {
    let repository = Repository {
        owner: "usf-cs212".to_string(),
        name: "project-jdoe".to_string(),
    };

    let mut run = RunContext::new(repository, actor);
    run.run_id = 9001;
    run.run_number = 42;
    run.event_name = event_name.to_string();
    run.event = serde_json::from_value::<EventPayload>(event).expect("valid event payload");
    run
}
