//! Review-side logic for submitted pull request reviews

pub mod update;

pub use update::{parse_pull_release, ReviewComment, ReviewEvent, ReviewOutcome};
