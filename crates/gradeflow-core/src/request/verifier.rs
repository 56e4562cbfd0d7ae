//! Request eligibility rules evaluated against the release capabilities and label history

use super::history::{History, ProjectHistory, ProjectStage};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::http::at_page_cap;
use crate::output::StepReport;
use crate::release::CapabilityReport;
use crate::traits::GitHubApi;
use crate::types::{Issue, Label, RequestType, Version};

/// Everything a verification needs besides the API
#[derive(Debug, Clone)]
pub struct VerifyInput<'a> {
    /// Requested type
    pub request_type: RequestType,
    /// Release version named in the issue
    pub version: Version,
    /// Capabilities of that release
    pub capabilities: &'a CapabilityReport,
    /// Issue being verified
    pub issue_number: u64,
}

fn reject(message: String) -> Error {
    Error::Eligibility(message)
}

/// Timestamp of the first review on `pull_number` by an approver
pub async fn approval_date<A: GitHubApi>(
    api: &A,
    settings: &Settings,
    pull_number: u64,
) -> Result<String> {
    let unknown = || {
        reject(format!(
            "Unable to determine when pull request #{} was approved.",
            pull_number
        ))
    };

    let reviews = api.list_reviews(pull_number).await.map_err(|e| {
        tracing::info!(pull = pull_number, error = %e, "listing reviews failed");
        unknown()
    })?;

    reviews
        .into_iter()
        .find(|r| settings.is_approver(&r.user))
        .and_then(|r| r.submitted_at)
        .ok_or_else(unknown)
}

/// Verifies a request issue and records outputs and labels.
///
/// The `labels` output is always written, holding whatever labels were
/// accumulated before a rejection.
pub struct RequestVerifier<'a, A> {
    api: &'a A,
    settings: &'a Settings,
}

impl<'a, A: GitHubApi> RequestVerifier<'a, A> {
    /// Verifier over an API client
    pub fn new(api: &'a A, settings: &'a Settings) -> Self {
        Self { api, settings }
    }

    /// Run every rule for the request type.
    ///
    /// A rejection is returned as an eligibility error after partial
    /// outputs are recorded; non-fatal problems go straight to `report`.
    pub async fn verify(&self, input: &VerifyInput<'_>, report: &mut StepReport) -> Result<()> {
        let mut labels = Vec::new();
        let result = self.evaluate(input, report, &mut labels).await;
        report.set_output("labels", serde_json::to_string(&labels)?);
        result
    }

    async fn evaluate(
        &self,
        input: &VerifyInput<'_>,
        report: &mut StepReport,
        labels: &mut Vec<String>,
    ) -> Result<()> {
        let version = input.version;
        let major = version.major;

        if !input.capabilities.allows(input.request_type) {
            return Err(reject(format!(
                "The release {} is not eligible for this type of request. See the release run for details.",
                input.capabilities.release
            )));
        }

        labels.push(version.project_label());
        labels.push(version.tag());
        report.set_output("milestone_name", format!("Project {}", major));

        let issues = self.api.list_issues().await?;
        if at_page_cap(issues.len()) {
            report.push_error("Maximum number of issues exceeded. Results may be unreliable.");
        }

        let history = History::build(&issues);
        let empty = ProjectHistory::default();
        let current = history.project(major).unwrap_or(&empty);
        let previous = major.checked_sub(1).and_then(|p| history.project(p));

        tracing::debug!(project = major, stage = ?current.stage(), "project history");

        let reviews = current.code_reviews();
        let found = reviews.len();
        let grades = current.review_grades();

        report.set_output("found_reviews", found);
        report.set_output("review_grades", grades);
        report.info(format!(
            "Found {} code reviews for project {}: {}",
            found,
            major,
            reviews
                .iter()
                .map(|i| i.number.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        let ctx = Rules {
            input,
            version,
            current,
            previous,
            reviews: &reviews,
            starting_points: self.settings.starting_points,
        };

        match input.request_type {
            RequestType::GradeTests => ctx.grade_tests(report, labels),
            RequestType::RequestReview => self.request_review(&ctx, report, labels).await,
            RequestType::GradeReview => self.grade_review(&ctx, report, labels).await,
            RequestType::GradeDesign => ctx.grade_design(report, labels),
        }
    }

    async fn request_review(
        &self,
        ctx: &Rules<'_>,
        report: &mut StepReport,
        labels: &mut Vec<String>,
    ) -> Result<()> {
        let Version { major, minor, .. } = ctx.version;
        let current = ctx.current;
        let found = ctx.reviews.len();
        let grades = current.review_grades();

        let stage = current.stage();
        if stage == ProjectStage::None || !current.has(Label::GradeTests) {
            return Err(reject(format!(
                "You must have a passing project {} tests grade issue before requesting your first code review appointment.",
                major
            )));
        }

        if matches!(stage, ProjectStage::Passed | ProjectStage::DesignGraded) {
            if let Some(passed) = current
                .first(Label::ReviewPassed)
                .or_else(|| current.first(Label::GradeDesign))
            {
                return Err(reject(format!(
                    "You passed code review in #{} and do not need any more project {} code reviews. Did you mean to request a design grade instead?",
                    passed.number, major
                )));
            }
        }

        if let Some(previous) = ctx.previous {
            if !previous.has(Label::GradeDesign) {
                return Err(reject(format!(
                    "You must have a passing project {} design grade issue before requesting your first project {} code review appointment.",
                    major - 1,
                    major
                )));
            }
        }

        let prefix = ctx.version.cycle_prefix();
        for issue in ctx.reviews {
            if let Some(label) = issue.label_starting_with(&prefix) {
                return Err(reject(format!(
                    "You already had release {} code reviewed in pull request #{}. Did you mean to request a code review for a different release?",
                    label, issue.number
                )));
            }
        }

        if minor as usize != found {
            return Err(reject(format!(
                "The release version should be v{}.{}.x instead of v{}.{}.x to match the number of previous code reviews for this project.",
                major, found, major, minor
            )));
        }

        // Review grades exist only for the first two reviews
        if found != grades && minor < 3 {
            return Err(reject(format!(
                "Found {} code reviews but only {} review grade requests. Please request a review grade for your last code review before requesting your next code review appointment.",
                found, grades
            )));
        }

        report.set_output("last_type", "");
        report.set_output("last_pull", "");
        report.set_output("last_date", "");
        report.set_output("check_date", "");

        let mut next = if found >= 1 {
            Label::RequestQuickReview
        } else {
            Label::RequestCodeReview
        };

        if let Some(latest) = ctx.reviews.first() {
            report.info(format!(
                "Latest review: #{}, labels: {}",
                latest.number,
                latest.labels.join(", ")
            ));

            let last_type = latest.label_starting_with("request").unwrap_or_default();
            report.set_output("last_pull", latest.number);
            report.set_output("last_type", last_type);

            if latest
                .label_starting_with("resubmit")
                .is_some_and(|l| l.contains("code"))
            {
                next = Label::RequestCodeReview;
            }

            let last_date = approval_date(self.api, self.settings, latest.number).await?;
            report.set_output("last_date", &last_date);
            report.set_output("check_date", &last_date);
            report.info(format!(
                "Latest pull request #{} was approved at: {}",
                latest.number, last_date
            ));

            // A quick review does not reset the waiting period
            if last_type == Label::RequestQuickReview.name() {
                if let Some(earlier) = ctx.reviews.get(1) {
                    let check_date = approval_date(self.api, self.settings, earlier.number).await?;
                    report.info(format!(
                        "Earlier pull request #{} was approved at: {}",
                        earlier.number, check_date
                    ));
                    report.set_output("check_date", check_date);
                }
            }
        }

        report.set_output("next_type", next);
        labels.push(next.name().into_owned());
        Ok(())
    }

    async fn grade_review(
        &self,
        ctx: &Rules<'_>,
        report: &mut StepReport,
        labels: &mut Vec<String>,
    ) -> Result<()> {
        let Version { major, minor, .. } = ctx.version;
        let release = ctx.version.tag();

        if minor > 1 {
            return Err(reject(format!(
                "You do not need to request a project review grade for a v{}.{} release.",
                major, minor
            )));
        }

        let prefix = ctx.version.cycle_prefix();
        for issue in ctx.current.issues(Label::GradeReview) {
            if let Some(label) = issue.label_starting_with(&prefix) {
                return Err(reject(format!(
                    "You already requested project {} review grade for release {} in issue #{}. If you are missing an expected grade on Canvas, please post on Piazza.",
                    major, label, issue.number
                )));
            }
        }

        let Some(pull) = ctx.reviews.iter().find(|i| i.has_label(&release)) else {
            return Err(reject(format!(
                "Could not find an approved code review pull request for release {}. You cannot request this grade until the professor has reviewed your code and approved the pull request.",
                release
            )));
        };

        report.info(format!(
            "Found pull request #{} for release {}.",
            pull.number, release
        ));

        let submitted = approval_date(self.api, self.settings, pull.number).await?;
        report.set_output("submitted_date", submitted);

        labels.push(Label::GradeReview.name().into_owned());
        report.set_output("assignment_name", format!("Project v{}.{} Review", major, minor));
        report.set_output("starting_points", self.settings.starting_points);
        report.set_output("pull_request", pull.number);
        Ok(())
    }
}

/// Rule context shared by every request type
struct Rules<'a> {
    input: &'a VerifyInput<'a>,
    version: Version,
    current: &'a ProjectHistory,
    previous: Option<&'a ProjectHistory>,
    reviews: &'a [&'a Issue],
    starting_points: u32,
}

impl Rules<'_> {
    fn release_date(&self) -> &str {
        self.input
            .capabilities
            .release_date
            .as_deref()
            .unwrap_or_default()
    }

    fn grade_tests(&self, report: &mut StepReport, labels: &mut Vec<String>) -> Result<()> {
        let Version { major, minor, .. } = self.version;

        if minor > 1 {
            return Err(reject(format!(
                "You do not need to request a project test grade for a v{}.{} release.",
                major, minor
            )));
        }

        if let Some(previous) = self.previous {
            if !previous.has(Label::GradeReview) {
                return Err(reject(format!(
                    "You must request at least one review grade for project {} before requesting a tests grade for project {}.",
                    major - 1,
                    major
                )));
            }
            report.info(format!(
                "Found {} review grade requests for project {}.",
                previous.review_grades(),
                major - 1
            ));
        }

        labels.push(Label::GradeTests.name().into_owned());
        report.set_output("assignment_name", format!("Project v{}.{} Tests", major, minor));
        report.set_output("starting_points", self.starting_points);
        report.set_output("submitted_date", self.release_date());
        Ok(())
    }

    fn grade_design(&self, report: &mut StepReport, labels: &mut Vec<String>) -> Result<()> {
        let major = self.version.major;

        if let Some(existing) = self.current.first(Label::GradeDesign) {
            if existing.number != self.input.issue_number {
                return Err(reject(format!(
                    "You already requested a project {} design grade in issue #{}. You only need to request this grade ONCE per project. If the issue is closed and you do not see a grade on Canvas yet, please post on Piazza asking for an update.",
                    major, existing.number
                )));
            }
        }

        let passed = match self.current.stage() {
            ProjectStage::Passed | ProjectStage::DesignGraded => {
                self.current.first(Label::ReviewPassed)
            }
            _ => None,
        };
        let Some(passed) = passed else {
            return Err(reject(format!(
                "Unable to find a passing code review pull request for project {}. You must have a pull request that passed code review to request this grade.",
                major
            )));
        };

        let grades = self.current.review_grades();
        if grades < 2 {
            return Err(reject(format!(
                "Found only {} review grade request(s). Please request all review grades before requesting your design grade.",
                grades
            )));
        }

        report.info(format!(
            "Found pull request #{} passed code review for project {}.",
            passed.number, major
        ));

        labels.push(Label::GradeDesign.name().into_owned());
        report.set_output("assignment_name", format!("Project v{}.x Design", major));
        report.set_output("starting_points", self.starting_points);
        report.set_output("submitted_date", self.release_date());
        report.set_output("pull_request", passed.number);
        Ok(())
    }
}
