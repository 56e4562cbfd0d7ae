//! Request-side logic: issue parsing, label history, eligibility rules and scheduling

pub mod history;
pub mod parser;
pub mod schedule;
pub mod verifier;

pub use history::{History, ProjectHistory, ProjectStage};
pub use parser::{parse_request, parse_title, RequestDetails};
pub use schedule::ReviewKind;
pub use verifier::{approval_date, RequestVerifier, VerifyInput};
