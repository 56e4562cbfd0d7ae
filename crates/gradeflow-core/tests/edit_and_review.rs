//! `labeled-verify` edit guard and `review-update` on review pull requests

mod common;

use assert_matches::assert_matches;
use common::{run_context, Call, FakeGitHub};
use gradeflow_core::config::Settings;
use gradeflow_core::context::RunContext;
use gradeflow_core::output::Level;
use gradeflow_core::review::parse_pull_release;
use gradeflow_core::steps::{labeled, review, StepContext};
use gradeflow_core::Error;
use serde_json::json;

const RUN_URL: &str = "https://github.com/usf-cs212/project-jdoe/actions/runs/9001";

fn edit_run(action: &str, sender: &str) -> RunContext {
    run_context(
        "issues",
        sender,
        json!({
            "action": action,
            "issue": {"number": 40, "title": "Request Project Tests Grade"},
            "sender": {"login": sender},
            "label": {"name": "grade-tests"},
            "assignee": {"login": sender}
        }),
    )
}

#[tokio::test]
async fn test_staff_edits_are_allowed() {
    let api = FakeGitHub::new();
    let run = edit_run("labeled", "sjengle");
    let settings = Settings::default();

    let report = labeled::labeled_verify(StepContext::new(&api, &run, &settings)).await;
    assert!(!report.is_failed());
    assert_eq!(report.annotations()[0].message, "Action: labeled, Sender: sjengle");
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_student_label_is_removed() {
    let api = FakeGitHub::new();
    let run = edit_run("labeled", "jdoe");
    let settings = Settings::default();

    let report = labeled::labeled_verify(StepContext::new(&api, &run, &settings)).await;
    assert_eq!(report.failure(), Some("Action: labeled, Sender: jdoe"));
    assert_eq!(
        api.calls(),
        vec![
            Call::RemoveLabel {
                number: 40,
                name: "grade-tests".to_string()
            },
            Call::CreateComment {
                number: 40,
                body: format!(
                    "@jdoe there are 1 problem(s) with your labeled action:\n\n  1. Only approved users may modify issue labels and assignees!\n\n:octocat: See [run id 9001]({}) for details.",
                    RUN_URL
                )
            },
        ]
    );
}

#[tokio::test]
async fn test_student_assignment_is_removed() {
    let api = FakeGitHub::new();
    let run = edit_run("assigned", "jdoe");
    let settings = Settings::default();

    let report = labeled::labeled_verify(StepContext::new(&api, &run, &settings)).await;
    assert!(report.is_failed());
    assert_eq!(
        api.calls()[0],
        Call::RemoveAssignees {
            number: 40,
            assignees: vec!["jdoe".to_string()]
        }
    );
}

#[tokio::test]
async fn test_unexpected_edit_action() {
    let api = FakeGitHub::new();
    let run = edit_run("unlabeled", "jdoe");
    let settings = Settings::default();

    let report = labeled::labeled_verify(StepContext::new(&api, &run, &settings)).await;
    assert!(report.is_failed());

    let errors: Vec<&str> = report
        .annotations()
        .iter()
        .filter(|a| a.level == Level::Error)
        .map(|a| a.message.as_str())
        .collect();
    assert_eq!(
        errors,
        [
            "Only approved users may modify issue labels and assignees!",
            "Unexpected event type: `unlabeled`",
        ]
    );

    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert_matches!(&calls[0], Call::CreateComment { body, .. } if body.starts_with("@jdoe there are 2 problem(s) with your unlabeled action:"));
}

#[tokio::test]
async fn test_failed_undo_is_reported() {
    let api = FakeGitHub::new();
    api.fail_on("remove_label");
    let run = edit_run("labeled", "jdoe");
    let settings = Settings::default();

    let report = labeled::labeled_verify(StepContext::new(&api, &run, &settings)).await;
    assert!(report.is_failed());
    assert_matches!(
        api.calls().as_slice(),
        [Call::CreateComment { body, .. }] if body.contains("  1. Unable to undo the labeled action.\n")
    );
}

fn review_run(pull_body: &str, review_body: &str) -> RunContext {
    run_context(
        "pull_request_review",
        "sjengle",
        json!({
            "action": "submitted",
            "pull_request": {"number": 15, "body": pull_body, "assignee": {"login": "jdoe"}},
            "review": {"state": "approved", "body": review_body, "user": {"login": "sjengle"}},
            "sender": {"login": "sjengle"},
            "repository": {
                "name": "project-jdoe",
                "full_name": "usf-cs212/project-jdoe",
                "html_url": "https://github.com/usf-cs212/project-jdoe"
            }
        }),
    )
}

fn pull_body(release: &str) -> String {
    format!(
        "Code review for release {release}.\n\n```json\n{{\"release\": \"{release}\"}}\n```\n"
    )
}

/// Comment and label calls run concurrently; order them for comparison
fn comment_and_labels(api: &FakeGitHub) -> (String, Vec<String>) {
    let mut body = None;
    let mut labels = None;
    for call in api.calls() {
        match call {
            Call::CreateComment { number: 15, body: b } | Call::UpdateComment { body: b, .. } => {
                body = Some(b)
            }
            Call::AddLabels { number: 15, labels: l } => labels = Some(l),
            other => panic!("unexpected call {:?}", other),
        }
    }
    (body.expect("comment"), labels.expect("labels"))
}

#[tokio::test]
async fn test_pull_body_without_json() {
    let api = FakeGitHub::new();
    let run = review_run("Please review my code.", "Pass");
    let settings = Settings::default();

    let report = review::review_update(StepContext::new(&api, &run, &settings), None).await;
    assert_eq!(
        report.failure(),
        Some("Unable to locate JSON configuration in pull request body.")
    );
    assert_eq!(report.output("review_label"), Some("error"));

    let (body, labels) = comment_and_labels(&api);
    assert_eq!(labels, ["error"]);
    assert!(body.starts_with(":octocat: @jdoe, there was an issue with this review:\n\n  - Unable to locate JSON configuration in pull request body.\n\n"));
    assert!(body.ends_with(&format!("See [run #42 (id 9001)]({}) for details.", RUN_URL)));
}

#[tokio::test]
async fn test_review_passed() {
    let api = FakeGitHub::new();
    let run = review_run(&pull_body("v2.1.0"), "Nice work.\nPASS\n");
    let settings = Settings::default();

    let report = review::review_update(StepContext::new(&api, &run, &settings), Some(55)).await;
    assert!(!report.is_failed(), "{:?}", report.failure());
    assert_eq!(report.output("review_label"), Some("review-passed"));

    let calls = api.calls();
    assert!(calls.iter().any(|c| matches!(c, Call::UpdateComment { id: 55, .. })));
    let (body, labels) = comment_and_labels(&api);
    assert_eq!(labels, ["review-passed"]);
    assert!(body.starts_with(":tada: Congratulations @jdoe, you **passed** code review for project 2!"));
    assert!(body.contains("create a final `v2.2.x` release"));
    assert!(body.contains("Merge the functionality for project 3 into the `main` branch."));
}

#[tokio::test]
async fn test_review_resubmit() {
    let api = FakeGitHub::new();
    let run = review_run(&pull_body("v1.0.2"), "Resubmit for a quick review");
    let settings = Settings::default();

    let report = review::review_update(StepContext::new(&api, &run, &settings), None).await;
    assert!(!report.is_failed());

    let (body, labels) = comment_and_labels(&api);
    assert_eq!(labels, ["resubmit-quick-review"]);
    assert!(body.contains("request your project 1 review 1 grade. Use release `v1.0.2` in the request."));
    assert!(body.contains("https://github.com/usf-cs212/project-jdoe/issues/new?assignees=&labels=&template=request-project-review.md&title=Request+Project+Code+Review"));
    assert!(body.contains("create a new `v1.1.x` release"));

    // No more review grades after the second review
    let api = FakeGitHub::new();
    let run = review_run(&pull_body("v1.2.0"), "resubmit");
    let report = review::review_update(StepContext::new(&api, &run, &settings), None).await;
    assert!(!report.is_failed());

    let (body, labels) = comment_and_labels(&api);
    assert_eq!(labels, ["resubmit-code-review"]);
    assert!(!body.contains("Request Project Review Grade"));
}

#[tokio::test]
async fn test_unrecognized_review_text() {
    let api = FakeGitHub::new();
    let run = review_run(&pull_body("v1.0.0"), "Looks fine to me   ");
    let settings = Settings::default();

    let report = review::review_update(StepContext::new(&api, &run, &settings), None).await;
    assert_eq!(
        report.failure(),
        Some("The review comment has an unexpected format: Looks fine to me")
    );

    let (body, labels) = comment_and_labels(&api);
    assert_eq!(labels, ["error"]);
    assert!(body.contains("  > Looks fine to me\n"));
}

#[tokio::test]
async fn test_review_update_api_failure() {
    let api = FakeGitHub::new();
    api.fail_on("add_labels");
    let run = review_run(&pull_body("v1.0.0"), "pass");
    let settings = Settings::default();

    let report = review::review_update(StepContext::new(&api, &run, &settings), None).await;
    assert_eq!(report.failure(), Some("Unable to update pull request #15."));
    assert_eq!(report.output("review_label"), Some("review-passed"));
    assert_matches!(api.calls().as_slice(), [Call::CreateComment { number: 15, .. }]);
}

#[test]
fn test_pull_release_errors() {
    assert_matches!(parse_pull_release("no block"), Err(Error::Parse(_)));
    assert_matches!(
        parse_pull_release("```json\n{\"release\": \"v1.0\"}\n```"),
        Err(Error::Parse(msg)) if msg == "Unable to parse \"v1.0\" into major, minor, and patch version numbers."
    );
    assert_matches!(
        parse_pull_release("```json\n{release: v1.0.0}\n```"),
        Err(Error::Parse(msg)) if msg == "Unable to parse JSON configuration in pull request body."
    );
}
