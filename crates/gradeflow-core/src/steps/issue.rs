//! Request issue steps: parse, verify, comment, pull, protect, milestone and release run lookup

use super::{ReleaseInput, StepContext};
use crate::error::{Error, Result};
use crate::http::at_page_cap;
use crate::output::StepReport;
use crate::release::CapabilityReport;
use crate::request::{parse_request, RequestVerifier, VerifyInput};
use crate::traits::GitHubApi;
use crate::types::{BranchProtection, RequestType};

/// `issue-parse`: request type from the title, student details from the body
pub fn issue_parse<A: GitHubApi>(cx: StepContext<'_, A>) -> StepReport {
    let mut report = StepReport::new();

    match cx.run.event.require_issue() {
        Ok(issue) => parse_request(&issue.title, issue.body.as_deref(), &mut report),
        Err(e) => report.push_failure(&e),
    }

    report.finish("parsing the request")
}

/// `issue-verify`: check the request against the release and the label history
pub async fn issue_verify<A: GitHubApi>(
    cx: StepContext<'_, A>,
    request_type: &str,
    release: &ReleaseInput,
    results_json: Option<&str>,
) -> StepReport {
    let mut report = StepReport::new();

    if let Err(e) = verify(cx, request_type, release, results_json, &mut report).await {
        report.push_failure(&e);
    }

    report.finish("verifying this request")
}

async fn verify<A: GitHubApi>(
    cx: StepContext<'_, A>,
    request_type: &str,
    release: &ReleaseInput,
    results_json: Option<&str>,
    report: &mut StepReport,
) -> Result<()> {
    let issue_number = cx
        .issue_number()
        .ok_or_else(|| Error::Parse("Event payload has no issue.".to_string()))?;
    let request_type: RequestType = request_type.parse()?;
    let capabilities = CapabilityReport::parse(results_json.unwrap_or_default())?;

    let input = VerifyInput {
        request_type,
        version: release.version,
        capabilities: &capabilities,
        issue_number,
    };

    RequestVerifier::new(cx.api, cx.settings)
        .verify(&input, report)
        .await
}

/// `issue-comment`: tell the student their request is being processed
pub async fn issue_comment<A: GitHubApi>(cx: StepContext<'_, A>) -> StepReport {
    let mut report = StepReport::new();
    let body = format!(":octocat: Your request is being processed. {}", cx.run.run_link());

    let created = match cx.issue_number() {
        Some(number) => cx.api.create_comment(number, &body).await,
        None => Err(Error::Parse("Event payload has no issue.".to_string())),
    };

    match created {
        Ok(comment) => {
            report.info(format!("Created comment id {}.", comment.id));
            report.set_output("comment_id", comment.id);
        }
        Err(e) => {
            report.info(e.to_string());
            report.fail(format!("Unable to add comment to issue {}.", cx.issue_ref()));
        }
    }

    report
}

/// `issue-pull`: open the review pull request from the request issue
pub async fn issue_pull<A: GitHubApi>(cx: StepContext<'_, A>, release: &ReleaseInput) -> StepReport {
    let mut report = StepReport::new();
    let head = cx.settings.review_branch(&release.tag);

    let created = match cx.issue_number() {
        Some(number) => {
            cx.api
                .create_pull_from_issue(&head, &cx.settings.main_branch, number)
                .await
        }
        None => Err(Error::Parse("Event payload has no issue.".to_string())),
    };

    match created {
        Ok(pull) => report.set_output("pull_request", pull.number),
        Err(e) => report.push_error(format!(
            "Unable to create pull request for release {} ({}).",
            release.tag, e
        )),
    }

    report.finish("creating the pull request")
}

/// `issue-protect`: require an approving review before the review branch merges
pub async fn issue_protect<A: GitHubApi>(
    cx: StepContext<'_, A>,
    release: &ReleaseInput,
) -> StepReport {
    let mut report = StepReport::new();
    let branch = cx.settings.review_branch(&release.tag);
    let protection = BranchProtection {
        required_approving_review_count: 1,
        bypass_users: cx.settings.staff(),
        allow_deletions: true,
    };

    if let Err(e) = cx.api.update_branch_protection(&branch, &protection).await {
        report.push_error(format!(
            "Unable to protect review branch for release {} ({}).",
            release.tag, e
        ));
    }

    report.finish("protecting the review branch")
}

/// `issue-milestone`: find the project milestone, creating it when missing
pub async fn issue_milestone<A: GitHubApi>(cx: StepContext<'_, A>, name: &str) -> StepReport {
    let mut report = StepReport::new();

    let found = async {
        let milestones = cx.api.list_milestones().await?;
        match milestones.into_iter().find(|m| m.title == name) {
            Some(existing) => Ok(existing),
            None => cx.api.create_milestone(name).await,
        }
    };

    match found.await {
        Ok(milestone) => {
            report.info(format!(
                "Milestone {} has number {}.",
                milestone.title, milestone.number
            ));
            report.set_output("milestone_id", milestone.number);
        }
        Err(e) => {
            tracing::debug!(error = %e, "milestone lookup failed");
            report.push_error(format!(
                "Unable to find or create {} milestone for this request.",
                name
            ));
        }
    }

    report.finish("finding milestone for this request")
}

/// `issue-action`: find the completed release workflow run for the tag
pub async fn issue_action<A: GitHubApi>(cx: StepContext<'_, A>, release_tag: &str) -> StepReport {
    let mut report = StepReport::new();
    report.info(format!("Release: {}", release_tag));

    match cx.api.list_workflow_runs(&cx.settings.release_workflow).await {
        Ok(runs) => {
            if at_page_cap(runs.len()) {
                report.push_error("Maximum number of workflow runs exceeded. Results may be unreliable.");
            }

            let matching: Vec<_> = runs
                .iter()
                .filter(|r| r.status == "completed" && r.head_branch == release_tag)
                .collect();

            match matching.first() {
                None => report.push_error(format!(
                    "Unable to find workflow run for release {}. Double-check the correct release version is entered and all action runs for that release have completed.",
                    release_tag
                )),
                Some(found) => {
                    if matching.len() > 1 {
                        report.warning(format!(
                            "Found {} workflow run(s) for release {}. Only the most recent run will be used. To use a different run, delete the other runs before re-triggering this action.",
                            matching.len(),
                            release_tag
                        ));
                    }
                    report.info(format!(
                        "Found run #{} (id {}) started at {} for release {}.",
                        found.run_number,
                        found.id,
                        found.run_started_at.as_deref().unwrap_or("unknown"),
                        release_tag
                    ));
                    report.set_output("run_id", found.id);
                    report.set_output("run_number", found.run_number);
                }
            }
        }
        Err(e) => report.push_failure(&e),
    }

    report.finish("fetching action run")
}
