//! Course settings: staff allow-lists, scheduling and repository conventions

use crate::error::{Error, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::path::Path;

/// Course-level settings.
///
/// Defaults match the course this tool was written for; a YAML file may
/// override any subset of fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Logins whose review approves a code review pull request
    pub approvers: Vec<String>,
    /// Logins assigned to grade requests
    pub graders: Vec<String>,
    /// Logins allowed to edit issue labels and assignees
    pub editors: Vec<String>,
    /// Days to wait between code review appointments
    pub review_delay_days: i64,
    /// Appointment page base URL; `/<code|quick>-review` is appended
    pub calendar_url: String,
    /// Offset from UTC, in minutes, used when displaying dates
    pub utc_offset_minutes: i32,
    /// Workflow file that verifies releases
    pub release_workflow: String,
    /// Branch review pull requests merge into
    pub main_branch: String,
    /// Prefix of review branches (`review/v1.2.0`)
    pub review_branch_prefix: String,
    /// Capability artifact file name
    pub results_file: String,
    /// Points a grade request starts from
    pub starting_points: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let graders: Vec<String> = ["halenander", "mtquach2", "ybsolomon"]
            .into_iter()
            .map(String::from)
            .collect();
        let approvers = vec!["sjengle".to_string()];
        let editors = graders.iter().chain(approvers.iter()).cloned().collect();

        Self {
            approvers,
            graders,
            editors,
            review_delay_days: 1,
            calendar_url: "https://calendly.com/sjengle".to_string(),
            // America/Los_Angeles standard time
            utc_offset_minutes: -8 * 60,
            release_workflow: "project-release.yml".to_string(),
            main_branch: "main".to_string(),
            review_branch_prefix: "review/".to_string(),
            results_file: "check-release-results.json".to_string(),
            starting_points: 100,
        }
    }
}

/// Longest waiting period between code review appointments
pub const MAX_REVIEW_DELAY_DAYS: i64 = 365;

impl Settings {
    /// Parse YAML settings and validate them
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Unable to read settings {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&raw)
    }

    /// Load from `path` when given, otherwise use the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Reject settings no step could work with
    pub fn validate(&self) -> Result<()> {
        if self.approvers.is_empty() {
            return Err(Error::Config("At least one approver is required".into()));
        }
        if !(0..=MAX_REVIEW_DELAY_DAYS).contains(&self.review_delay_days) {
            return Err(Error::Config(format!(
                "review_delay_days must be between 0 and {}: {}",
                MAX_REVIEW_DELAY_DAYS, self.review_delay_days
            )));
        }
        if self.utc_offset_minutes.unsigned_abs() >= 24 * 60 {
            return Err(Error::Config(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            )));
        }
        if self.main_branch.is_empty() || self.release_workflow.is_empty() {
            return Err(Error::Config(
                "main_branch and release_workflow must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Display time zone
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Review branch for a release tag
    pub fn review_branch(&self, tag: &str) -> String {
        format!("{}{}", self.review_branch_prefix, tag)
    }

    /// True when `login` may approve code reviews
    pub fn is_approver(&self, login: &str) -> bool {
        self.approvers.iter().any(|a| a == login)
    }

    /// True when `login` may edit issue labels and assignees
    pub fn is_editor(&self, login: &str) -> bool {
        self.editors.iter().any(|e| e == login)
    }

    /// Staff allowed to bypass review-branch protection
    pub fn staff(&self) -> Vec<String> {
        let mut staff = self.graders.clone();
        for approver in &self.approvers {
            if !staff.contains(approver) {
                staff.push(approver.clone());
            }
        }
        staff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.is_approver("sjengle"));
        assert!(!settings.is_approver("halenander"));
        assert!(settings.is_editor("halenander"));
        assert!(settings.is_editor("sjengle"));
        assert!(!settings.is_editor("student"));
        assert_eq!(
            settings.staff(),
            vec!["halenander", "mtquach2", "ybsolomon", "sjengle"]
        );
        assert_eq!(settings.review_branch("v1.2.0"), "review/v1.2.0");
    }

    #[test]
    fn test_yaml_overrides_subset() {
        let settings = Settings::from_yaml("approvers: [prof]\nreview_delay_days: 2\n").unwrap();
        assert_eq!(settings.approvers, vec!["prof"]);
        assert_eq!(settings.review_delay_days, 2);
        assert_eq!(settings.main_branch, "main");
    }

    #[test]
    fn test_yaml_rejects_unknown_fields() {
        let err = Settings::from_yaml("approver: [prof]\n").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn test_validation() {
        assert!(Settings::from_yaml("approvers: []\n").is_err());
        assert!(Settings::from_yaml("review_delay_days: -1\n").is_err());
        assert!(Settings::from_yaml("utc_offset_minutes: 1440\n").is_err());
        assert!(Settings::from_yaml("review_delay_days: 365\n").is_ok());
    }

    #[test]
    fn test_validation_extreme_values() {
        let err = Settings::from_yaml("utc_offset_minutes: -2147483648\n").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);

        let err = Settings::from_yaml("review_delay_days: 9223372036854775807\n").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
        assert!(Settings::from_yaml("review_delay_days: 366\n").is_err());
    }

    #[test]
    fn test_offset() {
        let settings = Settings::from_yaml("utc_offset_minutes: -420\n").unwrap();
        assert_eq!(settings.offset().local_minus_utc(), -420 * 60);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gradeflow.yml");
        std::fs::write(&path, "graders: [ta1]\n").unwrap();
        let settings = Settings::load_or_default(Some(&path)).unwrap();
        assert_eq!(settings.graders, vec!["ta1"]);
        assert!(Settings::load(&dir.path().join("missing.yml")).is_err());
    }
}
