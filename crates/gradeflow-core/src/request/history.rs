//! Per-project label history rebuilt from the repository's issues and pull requests

use crate::types::{Issue, Label, MAX_PROJECT};
use std::collections::HashMap;

/// Where a student stands on one project, derived from its labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStage {
    /// Nothing requested yet
    None,
    /// Tests grade requested
    TestsGraded,
    /// Code reviews completed without passing
    ReviewCycle(usize),
    /// A code review passed
    Passed,
    /// Design grade requested
    DesignGraded,
}

/// Issues of one project, indexed by request or outcome label
#[derive(Debug, Clone, Default)]
pub struct ProjectHistory {
    by_label: HashMap<Label, Vec<Issue>>,
}

impl ProjectHistory {
    fn push(&mut self, label: Label, issue: &Issue) {
        self.by_label.entry(label).or_default().push(issue.clone());
    }

    /// Issues carrying `label`, in listing order
    pub fn issues(&self, label: Label) -> &[Issue] {
        self.by_label.get(&label).map(Vec::as_slice).unwrap_or_default()
    }

    /// True when any issue carries `label`
    pub fn has(&self, label: Label) -> bool {
        !self.issues(label).is_empty()
    }

    /// First issue carrying `label`
    pub fn first(&self, label: Label) -> Option<&Issue> {
        self.issues(label).first()
    }

    /// Completed code reviews, most recent (highest number) first
    pub fn code_reviews(&self) -> Vec<&Issue> {
        let mut reviews: Vec<&Issue> = Label::REVIEW_OUTCOMES
            .iter()
            .flat_map(|label| self.issues(*label))
            .collect();
        reviews.sort_by(|a, b| b.number.cmp(&a.number));
        reviews
    }

    /// Number of review grade requests
    pub fn review_grades(&self) -> usize {
        self.issues(Label::GradeReview).len()
    }

    /// Furthest stage the labels show
    pub fn stage(&self) -> ProjectStage {
        if self.has(Label::GradeDesign) {
            ProjectStage::DesignGraded
        } else if self.has(Label::ReviewPassed) {
            ProjectStage::Passed
        } else if !self.code_reviews().is_empty() {
            ProjectStage::ReviewCycle(self.code_reviews().len())
        } else if self.has(Label::GradeTests) {
            ProjectStage::TestsGraded
        } else {
            ProjectStage::None
        }
    }
}

/// Label history of every project
#[derive(Debug, Clone, Default)]
pub struct History {
    projects: [ProjectHistory; MAX_PROJECT as usize],
    skipped: usize,
}

impl History {
    /// Index a listing of issues and pull requests.
    ///
    /// Issues labeled `error` or lacking a project label are skipped.
    pub fn build(issues: &[Issue]) -> Self {
        let mut history = Self::default();

        'issues: for issue in issues {
            let mut project = None;
            let mut kinds = Vec::new();

            for name in &issue.labels {
                match Label::parse(name) {
                    Some(Label::Error) => {
                        tracing::debug!(issue = issue.number, "skipping issue labeled error");
                        history.skipped += 1;
                        continue 'issues;
                    }
                    Some(Label::Project(n)) => project = Some(n),
                    Some(label) => kinds.push(label),
                    None => {}
                }
            }

            let Some(project) = project else {
                tracing::debug!(issue = issue.number, "skipping issue without project label");
                history.skipped += 1;
                continue;
            };

            let slot = &mut history.projects[usize::from(project - 1)];
            for label in kinds {
                slot.push(label, issue);
            }
        }

        history
    }

    /// History of project `major`; `None` outside 1 to 4
    pub fn project(&self, major: u8) -> Option<&ProjectHistory> {
        major
            .checked_sub(1)
            .and_then(|i| self.projects.get(usize::from(i)))
    }

    /// Number of skipped listing entries
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
