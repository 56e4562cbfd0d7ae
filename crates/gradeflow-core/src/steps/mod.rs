//! One entry point per workflow step.
//!
//! Every step takes a [`StepContext`] and returns a [`StepReport`]; steps
//! never return early without a report, so partial outputs always reach
//! the workflow.
//!
//! [`StepReport`]: crate::output::StepReport

pub mod issue;
pub mod labeled;
pub mod outcome;
pub mod release;
pub mod review;

use crate::config::Settings;
use crate::context::RunContext;
use crate::traits::GitHubApi;
use crate::types::Version;

/// What every step is handed: the API, the run context and course settings
pub struct StepContext<'a, A> {
    /// GitHub API
    pub api: &'a A,
    /// Current run
    pub run: &'a RunContext,
    /// Course settings
    pub settings: &'a Settings,
}

impl<A> Clone for StepContext<'_, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for StepContext<'_, A> {}

impl<'a, A: GitHubApi> StepContext<'a, A> {
    /// Bundle the step dependencies
    pub fn new(api: &'a A, run: &'a RunContext, settings: &'a Settings) -> Self {
        Self { api, run, settings }
    }

    /// Issue (or pull request) number of the triggering event
    pub fn issue_number(&self) -> Option<u64> {
        self.run.event.issue_or_pull_number()
    }

    /// `#N` for messages, `#?` when the event has no issue
    pub fn issue_ref(&self) -> String {
        match self.issue_number() {
            Some(n) => format!("#{}", n),
            None => "#?".to_string(),
        }
    }
}

/// Release a request or check refers to, as passed in by the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInput {
    /// Tag as given (`RELEASE_TAG`)
    pub tag: String,
    /// Parsed version
    pub version: Version,
}

impl ReleaseInput {
    /// Parse a release tag
    pub fn parse(tag: &str) -> crate::error::Result<Self> {
        Ok(Self {
            tag: tag.to_string(),
            version: Version::parse(tag)?,
        })
    }
}
