//! `review-update`: label a reviewed pull request and post the student's next steps

use super::StepContext;
use crate::error::{Error, Result};
use crate::output::StepReport;
use crate::review::{ReviewComment, ReviewEvent};
use crate::traits::GitHubApi;

/// Classify the submitted review, then update the comment and label concurrently.
///
/// Updates the comment `comment_id` when given, otherwise creates one.
pub async fn review_update<A: GitHubApi>(
    cx: StepContext<'_, A>,
    comment_id: Option<u64>,
) -> StepReport {
    let mut report = StepReport::new();
    let event = &cx.run.event;

    let Some(pull) = event.pull_request.as_ref() else {
        report.fail("Unable to update pull request (event payload has no pull request).");
        return report;
    };

    let student = pull
        .assignee
        .as_ref()
        .map(|a| a.login.as_str())
        .unwrap_or(cx.run.actor.as_str());
    let review = event.review.as_ref();
    let repo_url = event
        .repository
        .as_ref()
        .and_then(|r| r.html_url.clone())
        .unwrap_or_else(|| cx.run.repo_url());

    if let Some(state) = review.and_then(|r| r.state.as_deref()) {
        report.info(format!("Review state: {}", state));
    }

    let composed = ReviewComment::compose(&ReviewEvent {
        pull_number: pull.number,
        pull_body: pull.body.as_deref().unwrap_or_default(),
        student,
        review_body: review.and_then(|r| r.body.as_deref()).unwrap_or_default(),
        repo_url: &repo_url,
    });

    if let Some(reason) = &composed.failure {
        report.fail(reason.clone());
    }

    let body = composed.body(&cx.run.run_link());
    let label = [composed.label.name().into_owned()];

    let comment = async {
        match comment_id {
            Some(id) => cx.api.update_comment(id, &body).await,
            None => cx.api.create_comment(pull.number, &body).await.map(|_| ()),
        }
    };
    let labeled = cx.api.add_labels(pull.number, &label);

    let (commented, labeled): (Result<()>, Result<()>) = futures::join!(comment, labeled);

    report.set_output("review_label", composed.label);

    let failures: Vec<Error> = [commented, labeled]
        .into_iter()
        .filter_map(|r| r.err())
        .collect();

    if failures.is_empty() {
        report.info(format!("Pull request {} updated successfully.", pull.number));
    } else {
        for e in &failures {
            report.info(e.to_string());
        }
        report.fail(format!("Unable to update pull request #{}.", pull.number));
    }

    report
}
