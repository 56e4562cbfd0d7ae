//! Step report: outputs, annotations and accumulated errors of one step

use super::format::format_error_list;
use crate::error::Error;
use std::fmt::Display;

/// Severity of a workflow annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Plain log line
    Info,
    /// `::notice::`
    Notice,
    /// `::warning::`
    Warning,
    /// `::error::`
    Error,
}

/// A user-visible log line or annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Severity
    pub level: Level,
    /// Text
    pub message: String,
}

/// Everything a step produced, emitted whether or not it failed.
///
/// Steps push outputs and messages as they go; the writer renders the
/// report once at the end, so partial results always reach later steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    outputs: Vec<(String, String)>,
    errors: Vec<String>,
    annotations: Vec<Annotation>,
    failure: Option<String>,
}

impl StepReport {
    /// Empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a named output, replacing an earlier value
    pub fn set_output(&mut self, name: &str, value: impl Display) {
        let value = value.to_string();
        match self.outputs.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.outputs.push((name.to_string(), value)),
        }
    }

    /// Output value by name
    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All outputs in insertion order
    pub fn outputs(&self) -> &[(String, String)] {
        &self.outputs
    }

    /// Record a user-facing problem; it ends up in `error_messages`
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Record an error as a user-facing problem.
    ///
    /// Eligibility and parse errors are shown verbatim; anything else is
    /// reported as unexpected.
    pub fn push_failure(&mut self, err: &Error) {
        match err {
            Error::Eligibility(msg) | Error::Parse(msg) => self.push_error(msg.clone()),
            other => self.push_error(format!("Unexpected error: {}", other)),
        }
    }

    /// Accumulated problems
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Log line
    pub fn info(&mut self, message: impl Into<String>) {
        self.annotate(Level::Info, message);
    }

    /// Notice annotation
    pub fn notice(&mut self, message: impl Into<String>) {
        self.annotate(Level::Notice, message);
    }

    /// Warning annotation
    pub fn warning(&mut self, message: impl Into<String>) {
        self.annotate(Level::Warning, message);
    }

    /// Error annotation that does not by itself fail the step
    pub fn error(&mut self, message: impl Into<String>) {
        self.annotate(Level::Error, message);
    }

    fn annotate(&mut self, level: Level, message: impl Into<String>) {
        self.annotations.push(Annotation {
            level,
            message: message.into(),
        });
    }

    /// Annotations in the order they were recorded
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Mark the step failed; the first reason wins and later reasons
    /// become error annotations
    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.failure.is_none() {
            self.failure = Some(reason);
        } else {
            self.error(reason);
        }
    }

    /// Failure reason, if the step failed
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// True when the step failed
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Close out the step: publish `error_messages` and fail when any
    /// problem was recorded. `activity` completes "while ...".
    pub fn finish(mut self, activity: &str) -> Self {
        if !self.errors.is_empty() {
            let formatted = format_error_list(&self.errors);
            self.set_output("error_messages", formatted);

            let messages = self.errors.clone();
            for message in messages {
                self.error(message);
            }

            let reason = format!(
                "Found {} problems while {}.",
                self.errors.len(),
                activity
            );
            self.fail(reason);
        }
        self
    }
}
