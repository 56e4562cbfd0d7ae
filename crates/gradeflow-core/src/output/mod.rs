//! Step reports and their rendering for GitHub Actions

pub mod format;
pub mod report;
pub mod writer;

pub use report::{Annotation, Level, StepReport};
pub use writer::OutputWriter;
