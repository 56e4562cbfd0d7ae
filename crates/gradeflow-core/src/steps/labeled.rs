//! `labeled-verify`: undo label and assignee edits made by anyone outside the staff

use super::StepContext;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::output::format::format_error_list;
use crate::output::StepReport;
use crate::traits::GitHubApi;

/// Edits a non-editor may not make
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Label,
    Assignee,
}

impl Edit {
    fn from_action(action: &str) -> Option<Self> {
        match action {
            "labeled" => Some(Self::Label),
            "assigned" => Some(Self::Assignee),
            _ => None,
        }
    }
}

fn authorize(settings: &Settings, sender: &str) -> Result<()> {
    if settings.is_editor(sender) {
        Ok(())
    } else {
        Err(Error::UnauthorizedEdit(
            "Only approved users may modify issue labels and assignees!".to_string(),
        ))
    }
}

async fn undo<A: GitHubApi>(cx: StepContext<'_, A>, number: u64, edit: Edit) -> Result<String> {
    let event = &cx.run.event;
    match edit {
        Edit::Label => {
            let name = event
                .label
                .as_ref()
                .map(|l| l.name.clone())
                .ok_or_else(|| Error::Parse("Event payload has no label.".to_string()))?;
            cx.api.remove_label(number, &name).await?;
            Ok(name)
        }
        Edit::Assignee => {
            let login = event
                .assignee
                .as_ref()
                .map(|a| a.login.clone())
                .ok_or_else(|| Error::Parse("Event payload has no assignee.".to_string()))?;
            cx.api.remove_assignees(number, &[login.clone()]).await?;
            Ok(login)
        }
    }
}

/// Undo an edit by a non-editor and explain why on the issue
pub async fn labeled_verify<A: GitHubApi>(cx: StepContext<'_, A>) -> StepReport {
    let mut report = StepReport::new();
    let event = &cx.run.event;
    let action = event.action.as_deref().unwrap_or_default();
    let sender = event
        .sender
        .as_ref()
        .map(|s| s.login.as_str())
        .unwrap_or_default();
    let summary = format!("Action: {}, Sender: {}", action, sender);

    let denied = match authorize(cx.settings, sender) {
        Ok(()) => {
            report.info(summary);
            return report;
        }
        Err(e) => e,
    };

    report.fail(summary);

    let mut problems = vec![denied.message().to_string()];

    let Some(number) = cx.issue_number() else {
        report.error(problems[0].clone());
        report.error("Event payload has no issue.");
        return report;
    };

    match Edit::from_action(action) {
        Some(edit) => {
            report.info(format!("Undoing {} action on issue #{}...", action, number));
            match undo(cx, number, edit).await {
                Ok(removed) => report.info(format!("Removed {} from issue.", removed)),
                Err(e) => {
                    report.info(e.to_string());
                    problems.push(format!("Unable to undo the {} action.", action));
                }
            }
        }
        None => problems.push(format!("Unexpected event type: `{}`", action)),
    }

    for problem in &problems {
        report.error(problem.clone());
    }

    let body = format!(
        "@{} there are {} problem(s) with your {} action:\n\n{}\n:octocat: See [run id {}]({}) for details.",
        sender,
        problems.len(),
        action,
        format_error_list(&problems),
        cx.run.run_id,
        cx.run.run_url()
    );

    if let Err(e) = cx.api.create_comment(number, &body).await {
        tracing::debug!(issue = number, error = %e, "unable to comment on issue");
        report.info(format!("Unable to comment on issue #{}.", number));
    }

    report
}
