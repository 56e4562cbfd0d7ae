//! Closing steps of the request workflow: `issue-success` and `issue-failure`

use super::StepContext;
use crate::error::{Error, Result};
use crate::output::StepReport;
use crate::request::schedule::{
    appointment_link, display_date, eligible_date, parse_timestamp, ReviewKind,
};
use crate::results::RequestSteps;
use crate::traits::GitHubApi;
use crate::types::{IssueState, IssueUpdate, Label, RequestType};
use chrono::{DateTime, Utc};

const NOT_AVAILABLE: &str = "*N/A*";

/// Fixed messages for steps that fail without publishing `error_messages`
const STEP_FAILURES: [(&str, &str); 4] = [
    ("download_json", "Unable to download results from the release run."),
    ("calculate_grade", "Unable to calculate assignment grade."),
    ("create_pull", "Unable to create pull request for code review."),
    ("update_success", "Unable to update successful request status."),
];

/// Values shared by the success messages
struct Links {
    release_tag: String,
    release_link: String,
    request_link: String,
    verified_id: String,
    verified_link: String,
    name: String,
    email: String,
}

impl Links {
    fn new<A: GitHubApi>(cx: StepContext<'_, A>, steps: &RequestSteps) -> Self {
        let release_tag = steps.request("release_tag").unwrap_or_default().to_string();
        let verified_id = steps.release_run("run_id").unwrap_or_default().to_string();
        let verified_link = cx.run.run_url_for(verified_id.parse().unwrap_or_default());

        Self {
            release_link: cx.run.release_url(&release_tag),
            request_link: cx.run.run_url(),
            release_tag,
            verified_link,
            verified_id,
            name: steps.request("name").unwrap_or_default().to_string(),
            email: steps.request("email").unwrap_or_default().to_string(),
        }
    }

    fn release_cell(&self) -> String {
        format!(
            "[`{}`]({}) (verified in [run {}]({}))",
            self.release_tag, self.release_link, self.verified_id, self.verified_link
        )
    }
}

fn grade_message(actor: &str, links: &Links, steps: &RequestSteps) -> String {
    let grade = |name: &str| steps.grade(name).unwrap_or_default().to_string();
    let pull_request = steps
        .verified("pull_request")
        .map(|n| format!("Pull Request #{}", n))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    format!(
        "
:octocat: @{actor}, your [grade request]({request}) has been processed! See the details below:

|  |  |
|----:|:-----|
|   Student: | {name} |
| USF Email: | <{email}> |
| | |
|   Assignment: | {assignment} |
|      Release: | {release} |
| Pull Request: | {pull_request} |
|     Deadline: | {deadline} |
|    Submitted: | {submitted} |
| | |
| Late&nbsp;Interval: | {late_interval} hours (x{late_multiplier} multiplier) |
| Late&nbsp;Penalty:  | -{late_points} points (-{late_percent}%) |
| Final&nbsp;Grade:   | **{points}** / {possible} points ({percent}%) |

:white_check_mark: We will close this issue after updating your grade on Canvas. If your grade is not updated in 2 business days, please reach out on Piazza.
",
        actor = actor,
        request = links.request_link,
        name = links.name,
        email = links.email,
        assignment = grade("assignment_name"),
        release = links.release_cell(),
        pull_request = pull_request,
        deadline = grade("deadline_text"),
        submitted = grade("submitted_text"),
        late_interval = grade("late_interval"),
        late_multiplier = grade("late_multiplier"),
        late_points = grade("late_points"),
        late_percent = grade("late_percent"),
        points = grade("grade_points"),
        possible = grade("grade_possible"),
        percent = grade("grade_percent"),
    )
}

/// `download_json` outputs are JSON-encoded; accept bare text too
fn decode_output(raw: &str) -> String {
    serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw.to_string())
}

fn review_message<A: GitHubApi>(
    cx: StepContext<'_, A>,
    links: &Links,
    steps: &RequestSteps,
    now: DateTime<Utc>,
    report: &mut StepReport,
) -> String {
    let settings = cx.settings;
    let offset = settings.offset();
    let kind = ReviewKind::from_label(steps.verified("next_type").unwrap_or_default());
    let review_text = kind.title();

    let created = steps
        .downloaded("release_date")
        .map(decode_output)
        .and_then(|raw| parse_timestamp(&raw))
        .map(|d| display_date(d, offset))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mut last_pull = NOT_AVAILABLE.to_string();
    let mut last_length = NOT_AVAILABLE.to_string();
    let mut last_date_text = NOT_AVAILABLE.to_string();
    let mut last_date = None;
    let mut check_date = None;

    if let Some(last_type) = steps.verified("last_type") {
        last_pull = format!(
            "Pull Request #{}",
            steps.verified("last_pull").unwrap_or_default()
        );
        last_length = format!(
            "{} minutes",
            ReviewKind::from_label(last_type).appointment_minutes()
        );

        let raw = steps.verified("last_date").unwrap_or_default();
        last_date = parse_timestamp(raw);
        match last_date {
            Some(date) => last_date_text = display_date(date, offset),
            None => {
                report.warning(format!("Unable to parse last code review date: {}", raw));
                last_date_text = "*Undefined*".to_string();
            }
        }
        check_date = steps.verified("check_date").and_then(parse_timestamp);
    }

    let eligible = eligible_date(last_date, check_date, settings.review_delay_days, now);
    let eligible_text = display_date(eligible, offset);

    let issue_url = cx
        .run
        .event
        .issue
        .as_ref()
        .and_then(|i| i.html_url.clone())
        .unwrap_or_default();
    let signup = appointment_link(
        &settings.calendar_url,
        kind,
        eligible,
        offset,
        &links.name,
        &links.email,
        &issue_url,
    );
    let signup_text = format!(
        "Use [this personalized appointment signup link]({}) to sign up for a code review appointment. *This link will autofill most of the required information.*",
        signup
    );
    report.info(format!("Signup Link: {}", signup_text));

    format!(
        "
:octocat: @{actor}, your [{kind_lower} review request]({request}) for [release {tag}]({release_link}) is approved:

|  |  |
|----:|:-----|
|   Student: | {name} |
| USF Email: | <{email}> |
| | |
| Project: | {project} |
| Release: | {release} |
| Created: | {created} |
| | |
|   Last Review: | {last_pull} |
|   Review Date: | {last_date} |
| Review Length: | {last_length} |
| | |
|   This Review: | {minutes} min {kind} Review |
| Eligible Date: | {eligible} |

## Instructions

:eyes: Read the instructions below **carefully** to avoid common issues that will delay your appointment!

  1. :spiral_calendar: {signup}

  2. :warning: Make sure to sign up for a single appointment on or after **{eligible}**. *If there are no appointments in the next 3 business days, make a **public post** on Piazza to see if more can be added to the schedule.*

  3. :no_entry_sign: Do not make modifications to the code in your `main` branch before your appointment. *If your code is not ready for code review, close this request, cancel your appointment, and re-request a code review when your code is ready.*

  4. :stop_sign: Do not merge this pull request until **AFTER** the code review appointment. *If you accidentally merge this pull request before your appointment, you will have to close this review request, cancel your appointment, and re-request a code review.*

Make sure to attend your appointment on-time; arriving more than 5 minutes late may result in your appointment being cancelled.
",
        actor = cx.run.actor,
        kind_lower = review_text.to_lowercase(),
        request = links.request_link,
        tag = links.release_tag,
        release_link = links.release_link,
        name = links.name,
        email = links.email,
        project = steps.verified("milestone_name").unwrap_or_default(),
        release = links.release_cell(),
        created = created,
        last_pull = last_pull,
        last_date = last_date_text,
        last_length = last_length,
        minutes = kind.review_minutes(),
        kind = review_text,
        eligible = eligible_text,
        signup = signup_text,
    )
}

/// `issue-success`: post the result, request the reviewer, update the issue.
///
/// The three updates run one after the other; a failure in one does not
/// stop the next.
pub async fn issue_success<A: GitHubApi>(
    cx: StepContext<'_, A>,
    results: &str,
    comment_id: Option<u64>,
    now: DateTime<Utc>,
) -> StepReport {
    let mut report = StepReport::new();

    let steps = match RequestSteps::parse(results) {
        Ok(steps) => steps,
        Err(e) => {
            report.info(e.to_string());
            report.fail(format!(
                "Unable to update results for issue {}.",
                cx.issue_ref()
            ));
            return report;
        }
    };

    let request_type = steps
        .request("request_type")
        .and_then(|t| t.parse::<RequestType>().ok());
    report.info(format!(
        "Request Type: {}",
        steps.request("request_type").unwrap_or_default()
    ));

    // Comment
    let links = Links::new(cx, &steps);
    let message = match request_type {
        Some(t) if t.is_grade() => grade_message(&cx.run.actor, &links, &steps),
        Some(RequestType::RequestReview) => review_message(cx, &links, &steps, now, &mut report),
        _ => {
            report.warning(format!(
                "Unexpected request type: {}",
                steps.request("request_type").unwrap_or_default()
            ));
            format!(
                ":octocat: @{}, this is an [unexpected request type]({}). Please reach out to the instructor on Piazza.",
                cx.run.actor, links.request_link
            )
        }
    };

    let commented = match comment_id {
        Some(id) => cx.api.update_comment(id, &message).await,
        None => Err(Error::Parse("No comment id given.".to_string())),
    };
    match commented {
        Ok(()) => report.info(format!(
            "Updated issue comment id {} with request results.",
            comment_id.unwrap_or_default()
        )),
        Err(e) => {
            report.info(e.to_string());
            report.fail(format!(
                "Unable to update comment for issue {}.",
                cx.issue_ref()
            ));
        }
    }

    // Reviewer
    if request_type == Some(RequestType::RequestReview) {
        let pull = steps.pull("pull_request").unwrap_or_default();
        let requested = match pull.parse::<u64>() {
            Ok(number) => cx.api.request_reviewers(number, &cx.settings.approvers).await,
            Err(_) => Err(Error::Parse(format!("Invalid pull request number: {:?}", pull))),
        };
        match requested {
            Ok(()) => report.info(format!("Updated pull request #{} with reviewers.", pull)),
            Err(e) => {
                report.info(e.to_string());
                report.fail(format!(
                    "Unable to update pull request #{} with reviewers.",
                    pull
                ));
            }
        }
    }

    // Issue
    match update_issue(cx, &steps, request_type).await {
        Ok(()) => report.info(format!(
            "Updated issue {} with successful request.",
            cx.issue_ref()
        )),
        Err(e) => {
            report.info(e.to_string());
            report.fail(format!(
                "Unable to update results for issue {}.",
                cx.issue_ref()
            ));
        }
    }

    report
}

async fn update_issue<A: GitHubApi>(
    cx: StepContext<'_, A>,
    steps: &RequestSteps,
    request_type: Option<RequestType>,
) -> Result<()> {
    let number = cx
        .issue_number()
        .ok_or_else(|| Error::Parse("Event payload has no issue.".to_string()))?;

    let mut labels: Vec<String> = match steps.verified("labels") {
        Some(raw) => serde_json::from_str(raw)?,
        None => Vec::new(),
    };
    let milestone = steps.milestone("milestone_id").and_then(|m| m.parse().ok());

    let mut update = IssueUpdate {
        milestone,
        state: Some(IssueState::Open),
        ..IssueUpdate::default()
    };

    match request_type {
        Some(t) if t.is_grade() => update.assignees = Some(cx.settings.graders.clone()),
        Some(RequestType::RequestReview) => update.assignees = Some(vec![cx.run.actor.clone()]),
        _ => {
            labels.push(Label::Error.name().into_owned());
            update.state = Some(IssueState::Closed);
        }
    }
    update.labels = Some(labels);

    tracing::debug!(issue = number, ?update, "updating issue");
    cx.api.update_issue(number, &update).await
}

/// Comment body listing every upstream problem
pub fn failure_message(actor: &str, steps: &RequestSteps, run_link: &str) -> String {
    let mut message = format!(
        ":octocat: @{}, there are one or more problems with your request:\n\n",
        actor
    );

    for (_, step) in steps.iter() {
        if let Some(errors) = step.outputs.get("error_messages") {
            message.push_str(errors);
        }
    }

    for (name, text) in STEP_FAILURES {
        let failed = steps.iter().any(|(n, s)| n == name && s.failed());
        if failed {
            message.push_str(&format!("  1. {}\n", text));
        }
    }

    message.push_str(&format!(
        "\n:warning: You must address these problems and then re-open this issue. {}",
        run_link
    ));
    message
}

/// `issue-failure`: list the problems and close the issue
pub async fn issue_failure<A: GitHubApi>(
    cx: StepContext<'_, A>,
    results: &str,
    comment_id: Option<u64>,
) -> StepReport {
    let mut report = StepReport::new();

    let commented = async {
        let steps = RequestSteps::parse(results)?;
        let message = failure_message(&cx.run.actor, &steps, &cx.run.run_link());
        let id = comment_id.ok_or_else(|| Error::Parse("No comment id given.".to_string()))?;
        cx.api.update_comment(id, &message).await?;
        Ok::<u64, Error>(id)
    };

    match commented.await {
        Ok(id) => report.info(format!("Updated comment id {} with one or more errors.", id)),
        Err(e) => {
            report.info(e.to_string());
            report.fail(format!(
                "Unable to update comment for issue {}.",
                cx.issue_ref()
            ));
        }
    }

    let update = IssueUpdate {
        labels: Some(vec![Label::Error.name().into_owned()]),
        assignees: Some(vec![cx.run.actor.clone()]),
        state: Some(IssueState::Closed),
        state_reason: Some("not_planned".to_string()),
        ..IssueUpdate::default()
    };

    let closed = match cx.issue_number() {
        Some(number) => cx.api.update_issue(number, &update).await,
        None => Err(Error::Parse("Event payload has no issue.".to_string())),
    };

    match closed {
        Ok(()) => report.info(format!(
            "Closed issue {} with one or more errors.",
            cx.issue_ref()
        )),
        Err(e) => {
            report.info(e.to_string());
            report.fail(format!(
                "Unable to update results for issue {}.",
                cx.issue_ref()
            ));
        }
    }

    report
}
