//! Core type definitions shared by every step

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Highest project number a release tag may carry
pub const MAX_PROJECT: u8 = 4;

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^v([1-4])\.(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)$").expect("static tag pattern")
});

/// Release version: project number, code review cycle, re-release count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    /// Project number (1 to 4)
    pub major: u8,
    /// Completed code review cycles
    pub minor: u32,
    /// Re-releases within the current cycle
    pub patch: u32,
}

impl Version {
    /// Parse a bare `vM.m.p` tag
    pub fn parse(tag: &str) -> Result<Self> {
        let caps = TAG_PATTERN.captures(tag).ok_or_else(|| {
            Error::Parse(format!(
                "Unable to parse \"{}\" into major, minor, and patch version numbers.",
                tag
            ))
        })?;

        let number = |i: usize| -> Result<u32> {
            caps[i]
                .parse::<u32>()
                .map_err(|_| Error::Parse(format!("Version component too large in \"{}\".", tag)))
        };

        Ok(Self {
            major: number(1)? as u8,
            minor: number(2)?,
            patch: number(3)?,
        })
    }

    /// Parse a `refs/tags/vM.m.p` reference
    pub fn parse_ref(reference: &str) -> Result<Self> {
        let tag = reference.strip_prefix("refs/tags/").ok_or_else(|| {
            Error::Parse(format!(
                "Unable to parse \"{}\" into major, minor, and patch version numbers.",
                reference
            ))
        })?;
        Self::parse(tag)
    }

    /// Canonical tag (`v2.1.0`)
    pub fn tag(&self) -> String {
        self.to_string()
    }

    /// Tag prefix shared by every release of this review cycle (`v2.1`)
    pub fn cycle_prefix(&self) -> String {
        format!("v{}.{}", self.major, self.minor)
    }

    /// Label naming the project (`project2`)
    pub fn project_label(&self) -> String {
        Label::Project(self.major).name().into_owned()
    }

    /// Test-suite bucket: minor versions past the per-project limit collapse to `x`
    pub fn test_number(&self) -> String {
        let limit = if self.major == 3 { 2 } else { 1 };
        if self.minor > limit {
            format!("v{}.x", self.major)
        } else {
            format!("v{}.{}", self.major, self.minor)
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Kind of request a student files as an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    /// Project tests grade
    GradeTests,
    /// Project code review grade
    GradeReview,
    /// Project design grade
    GradeDesign,
    /// Code review appointment
    RequestReview,
}

impl RequestType {
    /// All request types
    pub const ALL: [RequestType; 4] = [
        RequestType::GradeTests,
        RequestType::GradeReview,
        RequestType::GradeDesign,
        RequestType::RequestReview,
    ];

    /// Map an issue title from the issue templates
    pub fn from_title(title: &str) -> Option<Self> {
        match title {
            "Request Project Tests Grade" => Some(Self::GradeTests),
            "Request Project Review Grade" => Some(Self::GradeReview),
            "Request Project Design Grade" => Some(Self::GradeDesign),
            "Request Project Code Review" => Some(Self::RequestReview),
            _ => None,
        }
    }

    /// Workflow name (`grade_tests`)
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GradeTests => "grade_tests",
            Self::GradeReview => "grade_review",
            Self::GradeDesign => "grade_design",
            Self::RequestReview => "request_review",
        }
    }

    /// True for the three grade requests
    pub const fn is_grade(&self) -> bool {
        !matches!(self, Self::RequestReview)
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::Parse(format!("Unexpected request type: {}", s)))
    }
}

/// Closed label vocabulary used as durable workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    /// `project<N>`
    Project(u8),
    /// `grade-tests`
    GradeTests,
    /// `grade-review`
    GradeReview,
    /// `grade-design`
    GradeDesign,
    /// `request-code-review`
    RequestCodeReview,
    /// `request-quick-review`
    RequestQuickReview,
    /// `resubmit-code-review`
    ResubmitCodeReview,
    /// `resubmit-quick-review`
    ResubmitQuickReview,
    /// `review-passed`
    ReviewPassed,
    /// `error`
    Error,
}

impl Label {
    /// Labels marking a completed code review on a pull request
    pub const REVIEW_OUTCOMES: [Label; 3] = [
        Label::ResubmitCodeReview,
        Label::ResubmitQuickReview,
        Label::ReviewPassed,
    ];

    /// Parse a GitHub label name; `None` for labels outside the vocabulary
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "grade-tests" => Some(Self::GradeTests),
            "grade-review" => Some(Self::GradeReview),
            "grade-design" => Some(Self::GradeDesign),
            "request-code-review" => Some(Self::RequestCodeReview),
            "request-quick-review" => Some(Self::RequestQuickReview),
            "resubmit-code-review" => Some(Self::ResubmitCodeReview),
            "resubmit-quick-review" => Some(Self::ResubmitQuickReview),
            "review-passed" => Some(Self::ReviewPassed),
            "error" => Some(Self::Error),
            other => {
                let digits = other.strip_prefix("project")?;
                if digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let n: u8 = digits.parse().ok()?;
                (1..=MAX_PROJECT).contains(&n).then_some(Self::Project(n))
            }
        }
    }

    /// GitHub label name
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Self::Project(n) => Cow::Owned(format!("project{}", n)),
            Self::GradeTests => Cow::Borrowed("grade-tests"),
            Self::GradeReview => Cow::Borrowed("grade-review"),
            Self::GradeDesign => Cow::Borrowed("grade-design"),
            Self::RequestCodeReview => Cow::Borrowed("request-code-review"),
            Self::RequestQuickReview => Cow::Borrowed("request-quick-review"),
            Self::ResubmitCodeReview => Cow::Borrowed("resubmit-code-review"),
            Self::ResubmitQuickReview => Cow::Borrowed("resubmit-quick-review"),
            Self::ReviewPassed => Cow::Borrowed("review-passed"),
            Self::Error => Cow::Borrowed("error"),
        }
    }

    /// True for the three review outcome labels
    pub fn is_review_outcome(&self) -> bool {
        Self::REVIEW_OUTCOMES.contains(self)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Issue or pull request as returned by the issues listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Issue number
    pub number: u64,
    /// Label names in API order
    pub labels: Vec<String>,
    /// Listing entry is a pull request
    pub is_pull_request: bool,
}

impl Issue {
    /// Check for an exact label name
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }

    /// First label whose name starts with `prefix`
    pub fn label_starting_with(&self, prefix: &str) -> Option<&str> {
        self.labels
            .iter()
            .map(String::as_str)
            .find(|l| l.starts_with(prefix))
    }
}

/// Pull request as returned by the pulls listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Global id
    pub id: u64,
    /// Pull request number
    pub number: u64,
    /// Label names
    pub labels: Vec<String>,
}

/// GitHub release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Release id
    pub id: u64,
    /// Tag name (`v1.0.0`)
    pub tag_name: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: Option<String>,
}

/// Pull request review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    /// Reviewer login
    pub user: String,
    /// Review state (`APPROVED`, `COMMENTED`, ...)
    pub state: String,
    /// Submission timestamp (RFC 3339)
    pub submitted_at: Option<String>,
}

/// Repository milestone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    /// Milestone number
    pub number: u64,
    /// Title (`Project 2`)
    pub title: String,
}

/// Issue comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comment {
    /// Comment id
    pub id: u64,
}

/// GitHub Actions workflow run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    /// Run id
    pub id: u64,
    /// Per-workflow run number
    pub run_number: u64,
    /// Run status (`completed`, `in_progress`, ...)
    pub status: String,
    /// Head branch; for release runs this is the tag
    pub head_branch: String,
    /// Start timestamp
    pub run_started_at: Option<String>,
}

/// Open or closed issue state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    /// Open
    Open,
    /// Closed
    Closed,
}

/// Partial issue update; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueUpdate {
    /// Replacement label set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// Replacement assignees
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    /// Milestone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
    /// Issue state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
    /// Close reason (`not_planned`, `completed`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_reason: Option<String>,
}

/// Branch protection applied to review branches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchProtection {
    /// Approving reviews required before merge
    pub required_approving_review_count: u32,
    /// Users allowed to bypass the review requirement
    pub bypass_users: Vec<String>,
    /// Whether the branch may be deleted
    pub allow_deletions: bool,
}
