pub mod applicant;
pub mod folder;
pub mod job;
pub mod report;
pub mod resume;

use thiserror::Error;

/// A persisted status string that does not name a known variant.
#[derive(Debug, Error)]
#[error("unknown {kind} status '{value}'")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}
