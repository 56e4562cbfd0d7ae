//! Release classification: tag reference to version and derived identifiers

use crate::error::Result;
use crate::output::StepReport;
use crate::types::Version;

/// A parsed release and the identifiers later steps need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Parsed version
    pub version: Version,
    /// Full reference (`refs/tags/v1.0.0`)
    pub release_ref: String,
    /// Release id
    pub release_id: u64,
    /// Creation timestamp
    pub release_date: Option<String>,
}

impl ReleaseInfo {
    /// Classify a release reference.
    ///
    /// The error message tells the student how to recover, since a
    /// mis-named release cannot be fixed by re-running the workflow.
    pub fn classify(release_ref: &str, release_id: u64, release_date: Option<String>) -> Result<Self> {
        let version = Version::parse_ref(release_ref).map_err(|_| {
            crate::error::Error::Parse(format!(
                "Unable to parse \"{}\" into major, minor, and patch version numbers. \
                 If a release was made in error, delete the release *and* tag (2 separate steps).",
                release_ref
            ))
        })?;

        Ok(Self {
            version,
            release_ref: release_ref.to_string(),
            release_id,
            release_date,
        })
    }

    /// Canonical tag
    pub fn tag(&self) -> String {
        self.version.tag()
    }

    /// Record the classification as step outputs
    pub fn record(&self, report: &mut StepReport) {
        report.set_output("version_major", self.version.major);
        report.set_output("version_minor", self.version.minor);
        report.set_output("version_patch", self.version.patch);
        report.set_output("release_tag", self.tag());
        report.set_output("release_ref", &self.release_ref);
        report.set_output("release_id", self.release_id);
        report.set_output(
            "release_date",
            self.release_date.as_deref().unwrap_or_default(),
        );
        report.set_output("test_number", self.version.test_number());
    }
}
