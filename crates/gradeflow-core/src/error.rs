//! Error types for gradeflow-core

use thiserror::Error as ThisError;

/// Result type alias for gradeflow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gradeflow operations
#[derive(Debug, ThisError)]
pub enum Error {
    /// Malformed tag, issue body, pull request body or upstream results
    #[error("Parse error: {0}")]
    Parse(String),

    /// Business rule rejection; the message is shown to the student as-is
    #[error("{0}")]
    Eligibility(String),

    /// GitHub API call failed (transport, status or decoding)
    #[error("GitHub API error: {0}")]
    Api(String),

    /// Requested GitHub resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// API rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Issue change made by a user outside the editor allow-list
    #[error("Unauthorized edit: {0}")]
    UnauthorizedEdit(String),

    /// Invalid configuration or runner context
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Runtime error (Tokio, task join, etc.)
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors carry the request URL but never headers
        Error::Api(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(format!("YAML error: {}", err))
    }
}

/// Fieldless error category for zero-cost pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// Parse error
    Parse,
    /// Eligibility rule violation
    Eligibility,
    /// GitHub API error
    Api,
    /// Missing GitHub resource
    NotFound,
    /// API rate limit exceeded
    RateLimitExceeded,
    /// Unauthorized issue edit
    UnauthorizedEdit,
    /// Configuration error
    Config,
    /// I/O error
    Io,
    /// Runtime error
    Runtime,
}

impl Error {
    /// Get the error kind.
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(_) => ErrorKind::Parse,
            Error::Eligibility(_) => ErrorKind::Eligibility,
            Error::Api(_) => ErrorKind::Api,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::RateLimitExceeded(_) => ErrorKind::RateLimitExceeded,
            Error::UnauthorizedEdit(_) => ErrorKind::UnauthorizedEdit,
            Error::Config(_) => ErrorKind::Config,
            Error::Io(_) => ErrorKind::Io,
            Error::Runtime(_) => ErrorKind::Runtime,
        }
    }

    /// Borrow the error message without the category prefix.
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Error::Parse(msg)
            | Error::Eligibility(msg)
            | Error::Api(msg)
            | Error::NotFound(msg)
            | Error::RateLimitExceeded(msg)
            | Error::UnauthorizedEdit(msg)
            | Error::Config(msg)
            | Error::Runtime(msg) => msg,
            Error::Io(_) => "I/O error",
        }
    }

    /// True for failures of the GitHub API itself rather than of the request.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Api | ErrorKind::NotFound | ErrorKind::RateLimitExceeded
        )
    }
}
