//! # Gradeflow Core
//!
//! GitHub Actions automation for course project submissions and code
//! review requests.
//!
//! Students publish releases and file request issues; each workflow step
//! checks the request against the repository's releases, pull requests
//! and label history, then reports back through labels, comments and step
//! outputs.
//!
//! - **release** checks: version classification, patch and minor number
//!   validation, and the capability report written as a workflow artifact
//! - **request** checks: issue parsing, per-project label history and the
//!   eligibility rules for grade and code review requests
//! - **review** handling: outcome classification and follow-up comments
//!
//! Every step is generic over [`GitHubApi`], implemented for real runs by
//! [`GitHubApiClient`] and by an in-memory repository in the tests.
//!
//! ## Example
//!
//! ```no_run
//! use gradeflow_core::config::Settings;
//! use gradeflow_core::context::RunContext;
//! use gradeflow_core::output::OutputWriter;
//! use gradeflow_core::steps::{issue, StepContext};
//! use gradeflow_core::GitHubApiClient;
//!
//! # async fn example() -> gradeflow_core::Result<()> {
//! let run = RunContext::from_env()?;
//! let api = GitHubApiClient::from_env()?;
//! let settings = Settings::default();
//!
//! let report = issue::issue_comment(StepContext::new(&api, &run, &settings)).await;
//! OutputWriter::emit(&report)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod output;
pub mod release;
pub mod request;
pub mod results;
pub mod review;
pub mod steps;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use http::GitHubApiClient;
pub use traits::GitHubApi;
pub use types::{Label, RequestType, Version};
