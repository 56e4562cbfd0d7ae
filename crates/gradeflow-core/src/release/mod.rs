//! Release-side checks: classification, version validation and capability aggregation

pub mod classifier;
pub mod results;
pub mod validators;

pub use classifier::ReleaseInfo;
pub use results::CapabilityReport;
pub use validators::{MinorValidator, PatchValidator, ReviewCount};
