//! Renders a step report as GitHub Actions outputs and workflow commands

use super::format::{heredoc_delimiter, safe_log_escape, safe_output_escape};
use super::report::{Level, StepReport};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Writer for `$GITHUB_OUTPUT`, the job log and artifact files
pub struct OutputWriter;

impl OutputWriter {
    /// Append every output using the multiline heredoc syntax
    pub fn write_outputs<W: Write>(report: &StepReport, w: &mut W) -> Result<()> {
        for (name, value) in report.outputs() {
            let delim = heredoc_delimiter(value);
            writeln!(w, "{name}<<{delim}")?;
            writeln!(w, "{value}")?;
            writeln!(w, "{delim}")?;
        }
        Ok(())
    }

    /// Write annotations, the output summary and the failure command to the job log
    pub fn write_log<W: Write>(report: &StepReport, w: &mut W) -> Result<()> {
        for annotation in report.annotations() {
            let message = safe_output_escape(&annotation.message);
            match annotation.level {
                Level::Info => writeln!(w, "{}", safe_log_escape(&annotation.message))?,
                Level::Notice => writeln!(w, "::notice::{message}")?,
                Level::Warning => writeln!(w, "::warning::{message}")?,
                Level::Error => writeln!(w, "::error::{message}")?,
            }
        }

        writeln!(w, "::group::Setting output...")?;
        for (name, value) in report.outputs() {
            writeln!(w, "{name}: {}", safe_output_escape(value))?;
        }
        writeln!(w, "::endgroup::")?;

        if let Some(reason) = report.failure() {
            writeln!(w, "::error::{}", safe_output_escape(reason))?;
        }
        Ok(())
    }

    /// Emit a report: outputs to `$GITHUB_OUTPUT` (stdout when unset), log to stdout
    pub fn emit(report: &StepReport) -> Result<()> {
        let stdout = std::io::stdout();
        let mut log = stdout.lock();

        match std::env::var("GITHUB_OUTPUT") {
            Ok(path) if !path.is_empty() => {
                let mut f = std::fs::OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(&path)?;
                Self::write_outputs(report, &mut f)?;
            }
            _ => {
                tracing::warn!("GITHUB_OUTPUT not set, writing outputs to stdout");
                Self::write_outputs(report, &mut log)?;
            }
        }

        Self::write_log(report, &mut log)?;
        log.flush()?;
        Ok(())
    }

    /// Write a JSON artifact file
    pub fn write_artifact<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let content = serde_json::to_string(value)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
