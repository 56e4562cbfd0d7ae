//! Runner context: repository, run identifiers and the triggering event payload

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Repository coordinates from `GITHUB_REPOSITORY`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Owner login
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl Repository {
    /// Parse `owner/repo`
    pub fn parse(value: &str) -> Result<Self> {
        match value.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(Error::Config(format!(
                "Invalid GITHUB_REPOSITORY format: {}",
                value
            ))),
        }
    }

    /// Read `GITHUB_REPOSITORY`
    pub fn from_env() -> Result<Self> {
        let repository = std::env::var("GITHUB_REPOSITORY")
            .map_err(|_| Error::Config("GITHUB_REPOSITORY not set".to_string()))?;
        Self::parse(&repository)
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// User reference inside an event payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPayload {
    /// Login
    pub login: String,
}

/// `issue` object of issue events
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssuePayload {
    /// Issue number
    pub number: u64,
    /// Issue title
    #[serde(default)]
    pub title: String,
    /// Issue body; null when the student left it empty
    pub body: Option<String>,
    /// Browser URL
    pub html_url: Option<String>,
}

/// `pull_request` object of pull request events
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestPayload {
    /// Pull request number
    pub number: u64,
    /// Pull request body
    pub body: Option<String>,
    /// Assigned student
    pub assignee: Option<UserPayload>,
}

/// `review` object of pull request review events
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPayload {
    /// Review state
    pub state: Option<String>,
    /// Review comment
    pub body: Option<String>,
    /// Reviewer
    pub user: Option<UserPayload>,
}

/// `release` object of release events
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleasePayload {
    /// Release id
    pub id: u64,
    /// Tag name
    pub tag_name: Option<String>,
    /// Creation timestamp
    pub created_at: Option<String>,
}

/// `label` object of labeled events
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelPayload {
    /// Label name
    pub name: String,
}

/// `repository` object present on every event
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryPayload {
    /// Repository name
    #[serde(default)]
    pub name: String,
    /// `owner/repo`
    #[serde(default)]
    pub full_name: String,
    /// Browser URL
    pub html_url: Option<String>,
}

/// `inputs` of a `workflow_dispatch` event
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchInputs {
    /// Release tag to process
    pub release_tag: Option<String>,
}

/// Subset of the webhook payload the steps read.
///
/// Every object is optional; each step validates the parts it needs once.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    /// Event action (`opened`, `labeled`, `assigned`, ...)
    pub action: Option<String>,
    /// Issue
    pub issue: Option<IssuePayload>,
    /// Pull request
    pub pull_request: Option<PullRequestPayload>,
    /// Pull request review
    pub review: Option<ReviewPayload>,
    /// Release
    pub release: Option<ReleasePayload>,
    /// Dispatch inputs
    pub inputs: Option<DispatchInputs>,
    /// User who triggered the event
    pub sender: Option<UserPayload>,
    /// Label added by a labeled event
    pub label: Option<LabelPayload>,
    /// User added by an assigned event
    pub assignee: Option<UserPayload>,
    /// Repository
    pub repository: Option<RepositoryPayload>,
}

impl EventPayload {
    /// Load the payload JSON written by the runner
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Issue number, falling back to the pull request number
    pub fn issue_or_pull_number(&self) -> Option<u64> {
        self.issue
            .as_ref()
            .map(|i| i.number)
            .or_else(|| self.pull_request.as_ref().map(|p| p.number))
    }

    /// Issue number or a parse error naming the missing object
    pub fn require_issue(&self) -> Result<&IssuePayload> {
        self.issue
            .as_ref()
            .ok_or_else(|| Error::Parse("Event payload has no issue.".to_string()))
    }
}

/// Everything a step knows about the current workflow run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Repository the run belongs to
    pub repository: Repository,
    /// Web server URL (`https://github.com`)
    pub server_url: String,
    /// Run id
    pub run_id: u64,
    /// Run number
    pub run_number: u64,
    /// Login that triggered the run
    pub actor: String,
    /// Triggering event name
    pub event_name: String,
    /// `GITHUB_REF`
    pub git_ref: Option<String>,
    /// Event payload
    pub event: EventPayload,
}

fn env_number(name: &str) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

impl RunContext {
    /// Minimal context for a repository; run identifiers default to zero
    pub fn new(repository: Repository, actor: impl Into<String>) -> Self {
        Self {
            repository,
            server_url: "https://github.com".to_string(),
            run_id: 0,
            run_number: 0,
            actor: actor.into(),
            event_name: String::new(),
            git_ref: None,
            event: EventPayload::default(),
        }
    }

    /// Read the runner's `GITHUB_*` variables and event payload file
    pub fn from_env() -> Result<Self> {
        let repository = Repository::from_env()?;

        let event = match std::env::var("GITHUB_EVENT_PATH") {
            Ok(path) if !path.is_empty() => EventPayload::from_file(Path::new(&path))?,
            _ => EventPayload::default(),
        };

        Ok(Self {
            repository,
            server_url: std::env::var("GITHUB_SERVER_URL")
                .unwrap_or_else(|_| "https://github.com".to_string()),
            run_id: env_number("GITHUB_RUN_ID"),
            run_number: env_number("GITHUB_RUN_NUMBER"),
            actor: std::env::var("GITHUB_ACTOR").unwrap_or_default(),
            event_name: std::env::var("GITHUB_EVENT_NAME").unwrap_or_default(),
            git_ref: std::env::var("GITHUB_REF").ok(),
            event,
        })
    }

    /// Browser URL of the repository
    pub fn repo_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.server_url, self.repository.owner, self.repository.name
        )
    }

    /// Browser URL of a workflow run
    pub fn run_url_for(&self, run_id: u64) -> String {
        format!("{}/actions/runs/{}", self.repo_url(), run_id)
    }

    /// Browser URL of this run
    pub fn run_url(&self) -> String {
        self.run_url_for(self.run_id)
    }

    /// Browser URL of a release
    pub fn release_url(&self, tag: &str) -> String {
        format!("{}/releases/tag/{}", self.repo_url(), tag)
    }

    /// `See [run #N (id I)](url) for details.`
    pub fn run_link(&self) -> String {
        format!(
            "See [run #{} (id {})]({}) for details.",
            self.run_number,
            self.run_id,
            self.run_url()
        )
    }
}
