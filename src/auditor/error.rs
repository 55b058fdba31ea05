//! Auditor error types.

use crate::builder::AuditError;
use crate::driver::DriverError;
use crate::policy::PolicyError;
use thiserror::Error;

/// Errors raised while auditing a lifecycle event end to end.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuditorError {
    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("Audit driver failed: {0}")]
    Driver(#[from] DriverError),
}

impl From<PolicyError> for AuditorError {
    fn from(err: PolicyError) -> Self {
        Self::Audit(AuditError::Policy(err))
    }
}
