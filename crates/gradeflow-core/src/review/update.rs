//! Review outcome classification and the follow-up comment posted on a review pull request

use crate::error::{Error, Result};
use crate::types::{Label, Version};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static JSON_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```json([^`]+)```").expect("static json block pattern"));

/// Outcome a reviewer signals in the review text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Resubmit for a quick review
    ResubmitQuick,
    /// Resubmit for a full code review
    ResubmitCode,
    /// Passed code review
    Passed,
    /// Text matched no outcome
    Unrecognized,
}

impl ReviewOutcome {
    /// Classify review text.
    ///
    /// "resubmit" takes precedence over "pass", so "resubmit, almost
    /// pass" is a resubmission.
    pub fn classify(review: &str) -> Self {
        let text = review.to_lowercase();
        let text = text.trim_end();

        if text.contains("resubmit") {
            if text.contains("quick") {
                Self::ResubmitQuick
            } else {
                Self::ResubmitCode
            }
        } else if text.ends_with("pass") {
            Self::Passed
        } else {
            Self::Unrecognized
        }
    }

    /// Label applied to the pull request
    pub fn label(&self) -> Label {
        match self {
            Self::ResubmitQuick => Label::ResubmitQuickReview,
            Self::ResubmitCode => Label::ResubmitCodeReview,
            Self::Passed => Label::ReviewPassed,
            Self::Unrecognized => Label::Error,
        }
    }
}

#[derive(Deserialize)]
struct PullConfig {
    release: Option<String>,
}

/// Release named by the fenced JSON block of a review pull request body
pub fn parse_pull_release(body: &str) -> Result<Version> {
    let block = JSON_BLOCK
        .captures(body)
        .and_then(|c| c.get(1))
        .ok_or_else(|| {
            Error::Parse("Unable to locate JSON configuration in pull request body.".to_string())
        })?;

    let config: PullConfig = serde_json::from_str(block.as_str()).map_err(|_| {
        Error::Parse("Unable to parse JSON configuration in pull request body.".to_string())
    })?;

    let release = config.release.unwrap_or_default();
    Version::parse(release.trim()).map_err(|_| {
        Error::Parse(format!(
            "Unable to parse \"{}\" into major, minor, and patch version numbers.",
            release
        ))
    })
}

/// Everything known about the review event
#[derive(Debug, Clone)]
pub struct ReviewEvent<'a> {
    /// Pull request number
    pub pull_number: u64,
    /// Pull request body
    pub pull_body: &'a str,
    /// Login of the student the pull request is assigned to
    pub student: &'a str,
    /// Review text
    pub review_body: &'a str,
    /// Repository web URL, for issue template links
    pub repo_url: &'a str,
}

/// Comment and label produced for a review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewComment {
    /// Label to add to the pull request
    pub label: Label,
    /// Opening line
    pub header: String,
    /// Checklist or explanation
    pub comment: String,
    /// Failure reason when the review could not be processed
    pub failure: Option<String>,
}

fn template_link(repo_url: &str, template: &str, title: &str) -> String {
    format!(
        "{}/issues/new?assignees=&labels=&template={}&title={}",
        repo_url,
        template,
        title.replace(' ', "+")
    )
}

fn merge_step(pull: u64) -> String {
    format!(
        "  - [ ] On GitHub, click the \"Merge\" button to merge this pull request #{} into the `main` branch. \
         Then, in Eclipse, use the \"Team\" » \"Pull\" option to pull the changes made to your `main` branch.",
        pull
    )
}

impl ReviewComment {
    /// Compose the comment for a review event
    pub fn compose(event: &ReviewEvent<'_>) -> Self {
        let outcome = ReviewOutcome::classify(event.review_body);
        let greeting = format!(":octocat: @{}, ", event.student);

        let version = match parse_pull_release(event.pull_body) {
            Ok(version) => version,
            Err(e) => {
                let message = e.message().to_string();
                return Self {
                    label: Label::Error,
                    header: format!("{}there was an issue with this review:", greeting),
                    comment: format!("  - {}", message),
                    failure: Some(message),
                };
            }
        };

        let major = version.major;
        let next = format!("v{}.{}.x", major, version.minor + 1);

        match outcome {
            ReviewOutcome::ResubmitQuick | ReviewOutcome::ResubmitCode => {
                let mut steps = Vec::new();
                if version.minor < 2 {
                    steps.push(format!(
                        "  - [ ] Use the [Request Project Review Grade]({}) issue template to request your project {} review {} grade. Use release `{}` in the request.",
                        template_link(event.repo_url, "request-project-grade-review.md", "Request Project Review Grade"),
                        major,
                        version.minor + 1,
                        version
                    ));
                }
                steps.push(merge_step(event.pull_number));
                steps.push(format!(
                    "  - [ ] Fix any remaining `TODO` comments in the code, then commit and push those changes to GitHub. Then, create a new `{}` release that passes all of the checks.",
                    next
                ));
                steps.push(format!(
                    "  - [ ] Use the [Request Project Code Review]({}) issue template to request your next code review appointment for the new `{}` release.",
                    template_link(event.repo_url, "request-project-review.md", "Request Project Code Review"),
                    next
                ));

                Self {
                    label: outcome.label(),
                    header: format!(
                        "{}your code review for project {} has been processed. Your next steps are:",
                        greeting, major
                    ),
                    comment: steps.join("\n"),
                    failure: None,
                }
            }
            ReviewOutcome::Passed => {
                let steps = [
                    merge_step(event.pull_number),
                    format!(
                        "  - [ ] Fix any remaining `TODO` comments in the code, then commit and push those changes to GitHub. Then, create a final `{}` release that passes all of the checks.",
                        next
                    ),
                    format!(
                        "  - [ ] Use the [Request Project Design Grade]({}) issue template to request your project {} design grade. Use the new `{}` release in the request.",
                        template_link(event.repo_url, "request-project-grade-design.md", "Request Project Design Grade"),
                        major,
                        next
                    ),
                    format!(
                        "  - [ ] Merge the functionality for project {} into the `main` branch.",
                        major + 1
                    ),
                ];

                Self {
                    label: outcome.label(),
                    header: format!(
                        ":tada: Congratulations @{}, you **passed** code review for project {}! Your next steps are:",
                        event.student, major
                    ),
                    comment: steps.join("\n"),
                    failure: None,
                }
            }
            ReviewOutcome::Unrecognized => Self {
                label: Label::Error,
                header: format!("{}the review comment has an unexpected format:", greeting),
                comment: format!("  > {}", event.review_body.trim_end()),
                failure: Some(format!(
                    "The review comment has an unexpected format: {}",
                    event.review_body.trim_end()
                )),
            },
        }
    }

    /// Full comment text with the run-link footer
    pub fn body(&self, footer: &str) -> String {
        format!("{}\n\n{}\n\n{}", self.header, self.comment, footer)
    }
}
