//! Release workflow steps: `release-parse`, `release-patch`, `release-minor`, `release-results`

use super::{ReleaseInput, StepContext};
use crate::config::Settings;
use crate::error::Error;
use crate::http::at_page_cap;
use crate::output::{Level, OutputWriter, StepReport};
use crate::release::{CapabilityReport, MinorValidator, PatchValidator, ReleaseInfo};
use crate::results::ReleaseJobs;
use crate::traits::GitHubApi;
use std::path::Path;
use tokio::task::JoinHandle;

/// Resolve the release reference from the triggering event
async fn resolve_release<A: GitHubApi>(
    cx: StepContext<'_, A>,
) -> std::result::Result<(String, u64, Option<String>), String> {
    let event = &cx.run.event;

    match cx.run.event_name.as_str() {
        "release" => {
            let release = event.release.as_ref().ok_or_else(|| {
                "Unable to fetch release (event payload has no release).".to_string()
            })?;
            let reference = match (&cx.run.git_ref, &release.tag_name) {
                (Some(r), _) if !r.is_empty() => r.clone(),
                (_, Some(tag)) => format!("refs/tags/{}", tag),
                _ => String::new(),
            };
            Ok((reference, release.id, release.created_at.clone()))
        }
        "workflow_dispatch" => {
            let tag = event
                .inputs
                .as_ref()
                .and_then(|i| i.release_tag.clone())
                .unwrap_or_default();
            let release = cx
                .api
                .get_release_by_tag(&tag)
                .await
                .map_err(|e| format!("Unable to fetch release {} ({}).", tag, e))?;
            Ok((
                format!("refs/tags/{}", release.tag_name),
                release.id,
                release.created_at,
            ))
        }
        other => Err(format!(
            "Unexpected event type for parsing release: {}",
            other
        )),
    }
}

/// `release-parse`: classify the release and start the release-body update.
///
/// The returned task replaces the release body with a run link; its
/// failure is logged and never affects the report.
pub async fn release_parse<A>(cx: StepContext<'_, A>) -> (StepReport, Option<JoinHandle<()>>)
where
    A: GitHubApi + Clone + 'static,
{
    let mut report = StepReport::new();

    let (reference, id, created_at) = match resolve_release(cx).await {
        Ok(found) => found,
        Err(reason) => {
            report.fail(reason);
            return (report, None);
        }
    };

    report.info(format!("Using release reference: {} (id {})", reference, id));

    let info = match ReleaseInfo::classify(&reference, id, created_at) {
        Ok(info) => info,
        Err(e) => {
            report.fail(e.message());
            return (report, None);
        }
    };
    info.record(&mut report);

    let api = cx.api.clone();
    let body = format!(":octocat: {}", cx.run.run_link());
    let handle = tokio::spawn(async move {
        if let Err(e) = api.update_release_body(id, &body).await {
            tracing::debug!(release = id, error = %e, "release body update failed");
        }
    });

    (report, Some(handle))
}

/// `release-patch`: the patch number must follow an existing release or start a cycle
pub async fn release_patch<A: GitHubApi>(cx: StepContext<'_, A>, input: &ReleaseInput) -> StepReport {
    let mut report = StepReport::new();
    let version = &input.version;

    report.info(format!(
        "Release: {}, Project: {}, Review: {}, Patch: {}",
        version, version.major, version.minor, version.patch
    ));

    if let Some(previous) = PatchValidator::previous(version) {
        match cx.api.get_release_by_tag(&previous.tag()).await {
            Ok(_) => report.info(format!("Found {} release...", previous)),
            Err(e) => {
                report.info(format!("Lookup of {} failed: {}", previous, e));
                report.fail(PatchValidator::missing_previous(version, &previous).message());
            }
        }
        return report;
    }

    let releases = match cx.api.list_releases().await {
        Ok(releases) => releases,
        Err(e) => {
            report.info(e.to_string());
            report.fail(format!(
                "Unable to check patch version of the {} release.",
                version
            ));
            return report;
        }
    };

    if at_page_cap(releases.len()) {
        report.error("Maximum number of releases exceeded. Results may be unreliable.");
    }

    match PatchValidator::check_first_of_cycle(version, &releases) {
        Ok(()) => report.info(format!(
            "Found no {}.# releases other than {}...",
            version.cycle_prefix(),
            version
        )),
        Err(e) => report.fail(e.message()),
    }

    report
}

/// `release-minor`: the minor number must equal the completed code reviews
pub async fn release_minor<A: GitHubApi>(cx: StepContext<'_, A>, input: &ReleaseInput) -> StepReport {
    let mut report = StepReport::new();
    let version = &input.version;

    report.info(format!(
        "Release: {}, Project: {}, Review: {}, Patch: {}",
        version, version.major, version.minor, version.patch
    ));

    let pulls = match cx.api.list_pulls().await {
        Ok(pulls) => pulls,
        Err(e) => {
            report.info(e.to_string());
            report.fail(format!(
                "Unable to check minor version of the {} release.",
                version
            ));
            return report;
        }
    };

    report.info(format!("Found {} pull requests.", pulls.len()));
    if at_page_cap(pulls.len()) {
        report.error("Maximum number of pull requests exceeded. Results may be unreliable.");
    }

    let counted = MinorValidator::count_reviews(version.major, &pulls);
    if let Some(id) = counted.passed {
        report.info(format!("Pull request {} passed code review.", id));
        report.set_output("review_passed", id);
    }

    match MinorValidator::check(version, &pulls) {
        Ok(counted) => report.info(format!(
            "Found {} code reviews for project {}.",
            counted.count, version.major
        )),
        Err(e) => report.fail(e.message()),
    }

    report
}

/// `release-results`: derive capabilities and write the artifact.
///
/// The artifact is written even when `results` cannot be parsed, with
/// every capability false.
pub fn release_results(
    settings: &Settings,
    input: &ReleaseInput,
    results: Option<&str>,
    artifact_dir: &Path,
) -> StepReport {
    let mut report = StepReport::new();
    let version = &input.version;
    let filename = settings.results_file.as_str();

    report.info(format!(
        "Release: {}, Project: {}, Review: {}, Patch: {}",
        input.tag, version.major, version.minor, version.patch
    ));

    let parsed = results
        .ok_or_else(|| Error::Parse("No job results given.".to_string()))
        .and_then(ReleaseJobs::parse);

    let capabilities = match parsed {
        Ok(jobs) => {
            let capabilities = CapabilityReport::aggregate(&input.tag, version, filename, &jobs);
            for (level, message) in capabilities.explain() {
                match level {
                    Level::Error => report.error(message),
                    Level::Notice => report.notice(message),
                    Level::Warning => report.warning(message),
                    Level::Info => report.info(message),
                }
            }
            capabilities
        }
        Err(e) => {
            report.info(e.to_string());
            report.fail(format!(
                "Could not fully verify results of the {} release.",
                input.tag
            ));
            CapabilityReport::empty(&input.tag, version, filename)
        }
    };

    if let Err(e) = OutputWriter::write_artifact(&artifact_dir.join(filename), &capabilities) {
        report.fail(format!("Unable to write {}: {}", filename, e));
    }

    capabilities.record(&mut report);
    report
}
