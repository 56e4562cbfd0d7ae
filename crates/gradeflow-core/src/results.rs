//! Typed views of upstream job and step results passed in as JSON
//!
//! Workflows hand earlier results to a step through `toJSON(needs)` or
//! `toJSON(steps)`. These types decode that blob once at the boundary so
//! the steps never index into untyped JSON.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashMap};

/// Output maps hold strings; anything else is kept as its JSON text
fn string_map<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| {
            let text = match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (k, text)
        })
        .collect())
}

/// Result of a single step (`steps.<id>`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepRecord {
    /// Outcome before `continue-on-error`
    pub outcome: Option<String>,
    /// Conclusion after `continue-on-error`
    pub conclusion: Option<String>,
    /// Step outputs
    #[serde(default, deserialize_with = "string_map")]
    pub outputs: HashMap<String, String>,
}

impl StepRecord {
    /// Output value; empty strings count as missing
    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// True when the step itself failed
    pub fn failed(&self) -> bool {
        self.outcome.as_deref() == Some("failure")
    }
}

fn output_of<'a>(step: &'a Option<StepRecord>, name: &str) -> Option<&'a str> {
    step.as_ref().and_then(|s| s.output(name))
}

/// Result of a job (`needs.<id>`); `status` carries that job's steps as JSON text
#[derive(Debug, Clone, Default)]
pub struct JobRecord {
    /// `success`, `failure`, `cancelled` or `skipped`
    pub result: Option<String>,
    /// Job outputs other than `status`
    pub outputs: HashMap<String, String>,
    /// Decoded `status` output
    pub steps: HashMap<String, StepRecord>,
}

impl<'de> Deserialize<'de> for JobRecord {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawJob {
            result: Option<String>,
            #[serde(default, deserialize_with = "string_map")]
            outputs: HashMap<String, String>,
        }

        let mut raw = RawJob::deserialize(deserializer)?;
        let steps = match raw.outputs.remove("status") {
            Some(status) if !status.trim().is_empty() => {
                serde_json::from_str(&status).map_err(serde::de::Error::custom)?
            }
            _ => HashMap::new(),
        };

        Ok(Self {
            result: raw.result,
            outputs: raw.outputs,
            steps,
        })
    }
}

impl JobRecord {
    /// True when the job succeeded
    pub fn succeeded(&self) -> bool {
        self.result.as_deref() == Some("success")
    }

    /// Output of one of the job's steps
    pub fn step_output(&self, step: &str, name: &str) -> Option<&str> {
        self.steps.get(step).and_then(|s| s.output(name))
    }
}

/// Jobs of the release workflow consumed by `release-results`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseJobs {
    /// Functionality tests
    pub check_tests: Option<JobRecord>,
    /// Style and version-number checks
    pub check_style: Option<JobRecord>,
}

impl ReleaseJobs {
    /// Decode the `RESULTS` blob
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| Error::Parse(format!("Unable to parse job results: {}", e)))
    }

    /// Tests job succeeded
    pub fn tests_passed(&self) -> bool {
        self.check_tests.as_ref().is_some_and(JobRecord::succeeded)
    }

    /// Style job succeeded
    pub fn style_passed(&self) -> bool {
        self.check_style.as_ref().is_some_and(JobRecord::succeeded)
    }

    /// Release creation date recorded by the release parse step
    pub fn release_date(&self) -> Option<&str> {
        self.check_tests
            .as_ref()
            .and_then(|j| j.step_output("parse_release", "release_date"))
    }

    /// Id of a pull request that passed code review, if the minor check found one
    pub fn review_passed(&self) -> Option<&str> {
        self.check_style
            .as_ref()
            .and_then(|j| j.step_output("check_minor", "review_passed"))
    }
}

/// Steps of the request workflow consumed by `issue-success` and `issue-failure`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestSteps {
    /// `issue-parse`
    pub parse_request: Option<StepRecord>,
    /// `issue-action`
    pub find_release: Option<StepRecord>,
    /// Artifact download from the release run
    pub download_json: Option<StepRecord>,
    /// `issue-verify`
    pub verify_request: Option<StepRecord>,
    /// Grade calculation
    pub calculate_grade: Option<StepRecord>,
    /// `issue-milestone`
    pub get_milestone: Option<StepRecord>,
    /// `issue-pull`
    pub create_pull: Option<StepRecord>,
    /// `issue-success`
    pub update_success: Option<StepRecord>,
    /// Any other step, ordered by id
    #[serde(flatten)]
    pub other: BTreeMap<String, StepRecord>,
}

impl RequestSteps {
    /// Decode the `RESULTS` blob
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| Error::Parse(format!("Unable to parse step results: {}", e)))
    }

    /// Named steps in workflow order, then the rest by id
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StepRecord)> {
        let named = [
            ("parse_request", &self.parse_request),
            ("find_release", &self.find_release),
            ("download_json", &self.download_json),
            ("verify_request", &self.verify_request),
            ("calculate_grade", &self.calculate_grade),
            ("get_milestone", &self.get_milestone),
            ("create_pull", &self.create_pull),
            ("update_success", &self.update_success),
        ];

        named
            .into_iter()
            .filter_map(|(name, step)| step.as_ref().map(|s| (name, s)))
            .chain(self.other.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// `parse_request` output
    pub fn request(&self, name: &str) -> Option<&str> {
        output_of(&self.parse_request, name)
    }

    /// `verify_request` output
    pub fn verified(&self, name: &str) -> Option<&str> {
        output_of(&self.verify_request, name)
    }

    /// `calculate_grade` output
    pub fn grade(&self, name: &str) -> Option<&str> {
        output_of(&self.calculate_grade, name)
    }

    /// `find_release` output
    pub fn release_run(&self, name: &str) -> Option<&str> {
        output_of(&self.find_release, name)
    }

    /// `download_json` output
    pub fn downloaded(&self, name: &str) -> Option<&str> {
        output_of(&self.download_json, name)
    }

    /// `get_milestone` output
    pub fn milestone(&self, name: &str) -> Option<&str> {
        output_of(&self.get_milestone, name)
    }

    /// `create_pull` output
    pub fn pull(&self, name: &str) -> Option<&str> {
        output_of(&self.create_pull, name)
    }
}
