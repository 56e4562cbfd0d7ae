//! Request issue parsing: title to request type, templated body to student details

use crate::error::{Error, Result};
use crate::output::StepReport;
use crate::types::{RequestType, Version};
use once_cell::sync::Lazy;
use regex::Regex;

static BODY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^### Full Name\s+([^\n]+)\s+### USF Email\s+([^\n]+)\s+### Release\s+([^\n]+)\b\s*$",
    )
    .expect("static issue body pattern")
});

/// Details a student fills into the request issue template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDetails {
    /// Full name
    pub name: String,
    /// University email
    pub email: String,
    /// Release text exactly as entered
    pub release: String,
}

impl RequestDetails {
    /// Parse the issue template body
    pub fn parse(body: &str) -> Result<Self> {
        let caps = BODY_PATTERN
            .captures(body)
            .ok_or_else(|| Error::Parse("Unable to parse details from issue body.".to_string()))?;

        Ok(Self {
            name: caps[1].trim().to_string(),
            email: caps[2].trim().to_string(),
            release: caps[3].trim().to_string(),
        })
    }

    /// Version named by the release field
    pub fn version(&self) -> Result<Version> {
        Version::parse(&self.release)
    }
}

/// Map an issue title to a request type
pub fn parse_title(title: &str) -> Result<RequestType> {
    RequestType::from_title(title).ok_or_else(|| {
        Error::Parse(format!(
            "Unable to determine request type from issue title: {}",
            title
        ))
    })
}

/// Parse a request issue, recording every problem and every output it can.
///
/// Title and body are checked independently so a student sees all
/// problems at once.
pub fn parse_request(title: &str, body: Option<&str>, report: &mut StepReport) {
    match parse_title(title) {
        Ok(request) => report.set_output("request_type", request),
        Err(e) => report.push_failure(&e),
    }

    let details = match RequestDetails::parse(body.unwrap_or_default()) {
        Ok(details) => details,
        Err(e) => {
            report.push_failure(&e);
            return;
        }
    };

    report.set_output("name", &details.name);
    report.set_output("email", &details.email);
    report.set_output("release", &details.release);

    match details.version() {
        Ok(version) => {
            report.set_output("version_major", version.major);
            report.set_output("version_minor", version.minor);
            report.set_output("version_patch", version.patch);
            report.set_output("release_tag", version.tag());
        }
        Err(_) => report.push_error(format!(
            "Unable to parse \"{}\" into major, minor, and patch version numbers.",
            details.release
        )),
    }
}
