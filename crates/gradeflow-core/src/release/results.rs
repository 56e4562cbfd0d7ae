//! Capability vector derived from a release's check results

use crate::error::{Error, Result};
use crate::output::{Level, StepReport};
use crate::results::ReleaseJobs;
use crate::types::{RequestType, Version};
use serde::{Deserialize, Deserializer, Serialize};

/// Artifact name the release workflow uploads the report under
pub const ARTIFACT_NAME: &str = "check-release-results";

/// Accepts `"123"` or `123`
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Which requests a release may be used for.
///
/// Serialized as the `check-release-results.json` artifact and read back
/// by `issue-verify` on the request side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityReport {
    /// Artifact name
    pub artifact: String,
    /// Artifact file name
    pub filename: String,
    /// Release tag
    pub release: String,
    /// Release creation timestamp
    #[serde(deserialize_with = "lenient_string")]
    pub release_date: Option<String>,
    /// Project number
    pub project: u8,
    /// Functionality tests passed
    pub check_tests: bool,
    /// Style and version checks passed
    pub check_style: bool,
    /// May request a tests grade
    pub grade_tests: bool,
    /// May request a code review appointment
    pub request_review: bool,
    /// May request a review grade
    pub grade_review: bool,
    /// May request a design grade
    pub grade_design: bool,
    /// Id of the pull request that passed code review
    #[serde(deserialize_with = "lenient_string")]
    pub review_passed: Option<String>,
}

impl CapabilityReport {
    /// Report with every capability false
    pub fn empty(release: &str, version: &Version, filename: &str) -> Self {
        Self {
            artifact: ARTIFACT_NAME.to_string(),
            filename: filename.to_string(),
            release: release.to_string(),
            project: version.major,
            ..Self::default()
        }
    }

    /// Derive capabilities from upstream job results.
    ///
    /// Pure: the same inputs always produce the same report.
    pub fn aggregate(release: &str, version: &Version, filename: &str, jobs: &ReleaseJobs) -> Self {
        let mut report = Self::empty(release, version, filename);

        report.check_tests = jobs.tests_passed();
        report.check_style = jobs.style_passed();
        report.release_date = jobs.release_date().map(str::to_string);
        report.review_passed = jobs.review_passed().map(str::to_string);

        if !report.check_tests {
            return report;
        }

        report.grade_tests = version.minor == 0;

        if !report.check_style {
            return report;
        }

        if report.review_passed.is_some() {
            report.grade_design = true;
        } else {
            report.request_review = true;
        }
        report.grade_review = version.minor < 2;

        report
    }

    /// Decode the artifact contents
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| Error::Parse(format!("Unable to parse release results: {}", e)))
    }

    /// Capability flag for a request type
    pub fn allows(&self, request: RequestType) -> bool {
        match request {
            RequestType::GradeTests => self.grade_tests,
            RequestType::GradeReview => self.grade_review,
            RequestType::GradeDesign => self.grade_design,
            RequestType::RequestReview => self.request_review,
        }
    }

    /// Messages explaining the report to the student
    pub fn explain(&self) -> Vec<(Level, String)> {
        let release = &self.release;
        let major = self.project;
        let mut lines = Vec::new();

        if !self.check_tests {
            lines.push((
                Level::Error,
                format!(
                    "The release {} may not be used to request any project {} grades or code reviews.",
                    release, major
                ),
            ));
            return lines;
        }

        if self.grade_tests {
            lines.push((
                Level::Notice,
                format!(
                    "The release {} may be used to request a project {} tests grade. This grade only needs to be requested once.",
                    release, major
                ),
            ));
        } else {
            lines.push((
                Level::Info,
                format!(
                    "The release {} cannot be used to request a project {} tests grade because of the minor version number.",
                    release, major
                ),
            ));
        }

        if !self.check_style {
            lines.push((
                Level::Notice,
                format!(
                    "The release {} cannot be used to request a project {} code review, review, or design grade because of the style checks.",
                    release, major
                ),
            ));
            return lines;
        }

        let message = match (self.grade_design, self.grade_review) {
            (true, true) => format!(
                "The release {} may be used to request a project {} review and design grade (request in two separate issues).",
                release, major
            ),
            (true, false) => format!(
                "The release {} may be used to request a project {} design grade. This grade only needs to be requested once.",
                release, major
            ),
            (false, true) => format!(
                "The release {} may be used to request a project {} code review appointment and review grade when that appointment is complete.",
                release, major
            ),
            (false, false) => format!(
                "The release {} may be used to request a project {} code review appointment.",
                release, major
            ),
        };
        lines.push((Level::Notice, message));
        lines
    }

    /// Record every field as a step output
    pub fn record(&self, report: &mut StepReport) {
        report.set_output("artifact", &self.artifact);
        report.set_output("filename", &self.filename);
        report.set_output("release", &self.release);
        report.set_output("release_date", self.release_date.as_deref().unwrap_or_default());
        report.set_output("project", self.project);
        report.set_output("check_tests", self.check_tests);
        report.set_output("check_style", self.check_style);
        report.set_output("grade_tests", self.grade_tests);
        report.set_output("request_review", self.request_review);
        report.set_output("grade_review", self.grade_review);
        report.set_output("grade_design", self.grade_design);
        report.set_output(
            "review_passed",
            self.review_passed.as_deref().unwrap_or_default(),
        );
    }
}
