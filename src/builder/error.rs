//! Audit construction errors.

use crate::modifier::ModifierError;
use crate::policy::PolicyError;
use thiserror::Error;

/// Errors that can occur while building an audit record.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuditError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Modifier(#[from] ModifierError),

    /// A required actor or context resolver is not configured.
    #[error("Invalid {resolver} implementation")]
    InvalidResolver { resolver: String },
}
