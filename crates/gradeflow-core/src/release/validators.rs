//! Version-number validation against existing releases and review pull requests

use crate::error::{Error, Result};
use crate::types::{Label, PullRequest, Release, Version};

fn delete_hint(version: &Version) -> String {
    format!(
        "You may want to delete the {} release *and* tag (two separate steps).",
        version
    )
}

/// Patch numbers must count up from zero within a review cycle
pub struct PatchValidator;

impl PatchValidator {
    /// Release a `patch > 0` release depends on
    pub fn previous(version: &Version) -> Option<Version> {
        version.patch.checked_sub(1).map(|patch| Version {
            patch,
            ..*version
        })
    }

    /// Message for a missing previous release
    pub fn missing_previous(version: &Version, previous: &Version) -> Error {
        Error::Eligibility(format!(
            "You must have a {} release before creating a {} release. {}",
            previous,
            version,
            delete_hint(version)
        ))
    }

    /// A `patch == 0` release must be the only release of its review cycle
    pub fn check_first_of_cycle(version: &Version, releases: &[Release]) -> Result<()> {
        let prefix = version.cycle_prefix();
        let tag = version.tag();
        let siblings: Vec<&str> = releases
            .iter()
            .map(|r| r.tag_name.as_str())
            .filter(|t| t.starts_with(&prefix))
            .collect();

        if siblings.len() == 1 && siblings[0] == tag {
            return Ok(());
        }

        Err(Error::Eligibility(format!(
            "You should not have other releases that start with {} when using a 0 patch number. {}",
            prefix,
            delete_hint(version)
        )))
    }
}

/// Completed code reviews found for one project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewCount {
    /// Pull requests with a review outcome label
    pub count: u32,
    /// Id of the pull request that passed review, if any
    pub passed: Option<u64>,
}

/// Minor numbers must equal the number of completed code reviews
pub struct MinorValidator;

impl MinorValidator {
    /// Count pull requests labeled for the project with a review outcome
    pub fn count_reviews(major: u8, pulls: &[PullRequest]) -> ReviewCount {
        let project = Label::Project(major).name();
        let mut counted = ReviewCount::default();

        for pull in pulls {
            let labels: Vec<&str> = pull.labels.iter().map(String::as_str).collect();
            if !labels.contains(&project.as_ref()) {
                continue;
            }

            if labels.contains(&"review-passed") {
                counted.passed = Some(pull.id);
                counted.count += 1;
            } else if labels.contains(&"resubmit-quick-review")
                || labels.contains(&"resubmit-code-review")
            {
                counted.count += 1;
            }
        }

        counted
    }

    /// Validate the minor number against the pull request listing
    pub fn check(version: &Version, pulls: &[PullRequest]) -> Result<ReviewCount> {
        if pulls.is_empty() {
            if version.minor != 0 {
                return Err(Error::Eligibility(format!(
                    "The release version should start with v{}.0, not with {}, since you have 0 code reviews. {}",
                    version.major,
                    version.cycle_prefix(),
                    delete_hint(version)
                )));
            }
            return Ok(ReviewCount::default());
        }

        let counted = Self::count_reviews(version.major, pulls);

        if counted.count != version.minor {
            return Err(Error::Eligibility(format!(
                "This release version should start with v{}.{}, not with {}, since you have {} code reviews for project {} already. {}",
                version.major,
                counted.count,
                version.cycle_prefix(),
                counted.count,
                version.major,
                delete_hint(version)
            )));
        }

        Ok(counted)
    }
}
