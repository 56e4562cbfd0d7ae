//! Release workflow steps against an in-memory repository

mod common;

use common::{pull, release, run_context, Call, FakeGitHub};
use gradeflow_core::config::Settings;
use gradeflow_core::release::CapabilityReport;
use gradeflow_core::steps::{release as steps, ReleaseInput, StepContext};
use gradeflow_core::RequestType;
use serde_json::json;

fn input(tag: &str) -> ReleaseInput {
    ReleaseInput::parse(tag).unwrap()
}

#[tokio::test]
async fn test_release_parse_from_release_event() {
    let api = FakeGitHub::new();
    let run = run_context(
        "release",
        "jdoe",
        json!({
            "action": "published",
            "release": {"id": 11, "tag_name": "v1.2.0", "created_at": "2024-02-01T18:30:00Z"}
        }),
    );
    let settings = Settings::default();

    let (report, pending) = steps::release_parse(StepContext::new(&api, &run, &settings)).await;
    pending.expect("release body task").await.unwrap();

    assert!(!report.is_failed());
    assert_eq!(report.output("version_major"), Some("1"));
    assert_eq!(report.output("version_minor"), Some("2"));
    assert_eq!(report.output("version_patch"), Some("0"));
    assert_eq!(report.output("release_tag"), Some("v1.2.0"));
    assert_eq!(report.output("release_ref"), Some("refs/tags/v1.2.0"));
    assert_eq!(report.output("release_id"), Some("11"));
    assert_eq!(report.output("release_date"), Some("2024-02-01T18:30:00Z"));
    assert_eq!(report.output("test_number"), Some("v1.x"));

    assert_eq!(
        api.calls(),
        vec![Call::UpdateReleaseBody {
            id: 11,
            body: ":octocat: See [run #42 (id 9001)](https://github.com/usf-cs212/project-jdoe/actions/runs/9001) for details.".to_string()
        }]
    );
}

#[tokio::test]
async fn test_release_parse_from_dispatch() {
    let api = FakeGitHub::new().with(|s| s.releases.push(release(12, "v3.0.1")));
    let run = run_context(
        "workflow_dispatch",
        "jdoe",
        json!({"inputs": {"release_tag": "v3.0.1"}}),
    );
    let settings = Settings::default();

    let (report, pending) = steps::release_parse(StepContext::new(&api, &run, &settings)).await;
    pending.expect("release body task").await.unwrap();

    assert!(!report.is_failed());
    assert_eq!(report.output("release_ref"), Some("refs/tags/v3.0.1"));
    assert_eq!(report.output("release_id"), Some("12"));
    assert_eq!(report.output("test_number"), Some("v3.0"));
}

#[tokio::test]
async fn test_release_parse_body_update_failure_is_ignored() {
    let api = FakeGitHub::new();
    api.fail_on("update_release_body");
    let run = run_context(
        "release",
        "jdoe",
        json!({"release": {"id": 5, "tag_name": "v2.0.0"}}),
    );
    let settings = Settings::default();

    let (report, pending) = steps::release_parse(StepContext::new(&api, &run, &settings)).await;
    pending.expect("release body task").await.unwrap();

    assert!(!report.is_failed());
    assert_eq!(report.output("release_tag"), Some("v2.0.0"));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_release_parse_rejects_bad_tag() {
    let api = FakeGitHub::new();
    let run = run_context(
        "release",
        "jdoe",
        json!({"release": {"id": 5, "tag_name": "v5.0.0"}}),
    );
    let settings = Settings::default();

    let (report, pending) = steps::release_parse(StepContext::new(&api, &run, &settings)).await;

    assert!(pending.is_none());
    let failure = report.failure().unwrap();
    assert!(failure.starts_with("Unable to parse \"refs/tags/v5.0.0\""));
    assert!(failure.contains("delete the release *and* tag"));
    assert_eq!(report.output("release_tag"), None);
}

#[tokio::test]
async fn test_release_parse_unknown_dispatch_release() {
    let api = FakeGitHub::new();
    let run = run_context(
        "workflow_dispatch",
        "jdoe",
        json!({"inputs": {"release_tag": "v1.0.0"}}),
    );
    let settings = Settings::default();

    let (report, pending) = steps::release_parse(StepContext::new(&api, &run, &settings)).await;

    assert!(pending.is_none());
    assert!(report.failure().unwrap().starts_with("Unable to fetch release v1.0.0"));
}

#[tokio::test]
async fn test_release_parse_unexpected_event() {
    let api = FakeGitHub::new();
    let run = run_context("push", "jdoe", json!({}));
    let settings = Settings::default();

    let (report, _) = steps::release_parse(StepContext::new(&api, &run, &settings)).await;

    assert_eq!(
        report.failure(),
        Some("Unexpected event type for parsing release: push")
    );
}

#[tokio::test]
async fn test_release_patch_requires_previous() {
    let api = FakeGitHub::new().with(|s| s.releases.push(release(1, "v1.0.0")));
    let run = run_context("release", "jdoe", json!({}));
    let settings = Settings::default();
    let cx = StepContext::new(&api, &run, &settings);

    let report = steps::release_patch(cx, &input("v1.0.1")).await;
    assert!(!report.is_failed());

    let report = steps::release_patch(cx, &input("v1.0.2")).await;
    assert_eq!(
        report.failure(),
        Some("You must have a v1.0.1 release before creating a v1.0.2 release. You may want to delete the v1.0.2 release *and* tag (two separate steps).")
    );
}

#[tokio::test]
async fn test_release_patch_zero_must_be_alone() {
    let api = FakeGitHub::new().with(|s| {
        s.releases = vec![
            release(1, "v1.0.0"),
            release(2, "v1.0.1"),
            release(3, "v1.1.0"),
            release(4, "v2.0.0"),
            release(5, "v2.0.1"),
        ]
    });
    let run = run_context("release", "jdoe", json!({}));
    let settings = Settings::default();
    let cx = StepContext::new(&api, &run, &settings);

    assert!(!steps::release_patch(cx, &input("v1.1.0")).await.is_failed());

    let report = steps::release_patch(cx, &input("v2.0.0")).await;
    assert!(report
        .failure()
        .unwrap()
        .starts_with("You should not have other releases that start with v2.0 when using a 0 patch number."));
}

#[tokio::test]
async fn test_release_patch_listing_failure() {
    let api = FakeGitHub::new();
    api.fail_on("list_releases");
    let run = run_context("release", "jdoe", json!({}));
    let settings = Settings::default();

    let report = steps::release_patch(StepContext::new(&api, &run, &settings), &input("v1.0.0")).await;
    assert_eq!(
        report.failure(),
        Some("Unable to check patch version of the v1.0.0 release.")
    );
}

#[tokio::test]
async fn test_release_minor_counts_reviews() {
    let api = FakeGitHub::new().with(|s| {
        s.pulls = vec![
            pull(501, 7, &["project1", "v1.0.0", "resubmit-code-review"]),
            pull(502, 9, &["project1", "v1.1.0", "resubmit-quick-review"]),
            pull(503, 12, &["project2", "v2.0.0", "review-passed"]),
            pull(504, 14, &["project1"]),
        ]
    });
    let run = run_context("release", "jdoe", json!({}));
    let settings = Settings::default();
    let cx = StepContext::new(&api, &run, &settings);

    let report = steps::release_minor(cx, &input("v1.2.0")).await;
    assert!(!report.is_failed());
    assert_eq!(report.output("review_passed"), None);

    let report = steps::release_minor(cx, &input("v1.1.3")).await;
    assert!(report
        .failure()
        .unwrap()
        .starts_with("This release version should start with v1.2, not with v1.1, since you have 2 code reviews for project 1 already."));

    let report = steps::release_minor(cx, &input("v2.1.0")).await;
    assert!(!report.is_failed());
    assert_eq!(report.output("review_passed"), Some("503"));
}

#[tokio::test]
async fn test_release_minor_keeps_review_passed_on_rejection() {
    let api = FakeGitHub::new().with(|s| s.pulls = vec![pull(503, 12, &["project2", "review-passed"])]);
    let run = run_context("release", "jdoe", json!({}));
    let settings = Settings::default();

    let report = steps::release_minor(StepContext::new(&api, &run, &settings), &input("v2.3.0")).await;
    assert!(report.is_failed());
    assert_eq!(report.output("review_passed"), Some("503"));
}

#[tokio::test]
async fn test_release_minor_without_pulls() {
    let api = FakeGitHub::new();
    let run = run_context("release", "jdoe", json!({}));
    let settings = Settings::default();
    let cx = StepContext::new(&api, &run, &settings);

    assert!(!steps::release_minor(cx, &input("v2.0.0")).await.is_failed());

    let report = steps::release_minor(cx, &input("v2.1.0")).await;
    assert!(report
        .failure()
        .unwrap()
        .starts_with("The release version should start with v2.0, not with v2.1, since you have 0 code reviews."));
}

fn job_results(tests: &str, style: &str, review_passed: Option<&str>) -> String {
    let parse_status = json!({
        "parse_release": {"outcome": "success", "outputs": {"release_date": "2024-02-01T18:30:00Z"}}
    });
    let minor_status = json!({
        "check_minor": {"outcome": "success", "outputs": {"review_passed": review_passed.unwrap_or("")}}
    });

    json!({
        "check_tests": {"result": tests, "outputs": {"status": parse_status.to_string()}},
        "check_style": {"result": style, "outputs": {"status": minor_status.to_string()}}
    })
    .to_string()
}

#[test]
fn test_release_results_writes_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::default();
    let results = job_results("success", "success", None);

    let report = steps::release_results(&settings, &input("v2.0.0"), Some(&results), dir.path());
    assert!(!report.is_failed());
    assert_eq!(report.output("grade_tests"), Some("true"));
    assert_eq!(report.output("request_review"), Some("true"));

    let written = std::fs::read_to_string(dir.path().join(&settings.results_file)).unwrap();
    let capabilities = CapabilityReport::parse(&written).unwrap();
    assert_eq!(capabilities.release, "v2.0.0");
    assert_eq!(capabilities.project, 2);
    assert_eq!(capabilities.release_date.as_deref(), Some("2024-02-01T18:30:00Z"));
    assert!(capabilities.allows(RequestType::GradeTests));
    assert!(capabilities.allows(RequestType::RequestReview));
    assert!(capabilities.allows(RequestType::GradeReview));
    assert!(!capabilities.allows(RequestType::GradeDesign));
}

#[test]
fn test_release_results_failed_tests() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::default();
    let results = job_results("failure", "success", Some("503"));

    let report = steps::release_results(&settings, &input("v2.1.0"), Some(&results), dir.path());
    assert!(!report.is_failed());

    let written = std::fs::read_to_string(dir.path().join(&settings.results_file)).unwrap();
    let capabilities = CapabilityReport::parse(&written).unwrap();
    for request in RequestType::ALL {
        assert!(!capabilities.allows(request), "{request} allowed");
    }
}

#[test]
fn test_release_results_unparsable_input_still_writes_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::default();

    let report = steps::release_results(&settings, &input("v1.0.0"), Some("{not json"), dir.path());
    assert_eq!(
        report.failure(),
        Some("Could not fully verify results of the v1.0.0 release.")
    );

    let written = std::fs::read_to_string(dir.path().join(&settings.results_file)).unwrap();
    let capabilities = CapabilityReport::parse(&written).unwrap();
    assert!(!capabilities.check_tests);
    assert!(!capabilities.allows(RequestType::GradeTests));
}
