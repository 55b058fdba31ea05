//! Driver error types.

use thiserror::Error;

/// Errors raised by audit persistence drivers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DriverError {
    /// Audits must belong to a persisted subject.
    #[error("Cannot store an audit of {subject_type} without a subject id")]
    MissingSubject { subject_type: String },
}
