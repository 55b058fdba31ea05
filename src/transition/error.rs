//! Transition error types.

use crate::modifier::ModifierError;
use thiserror::Error;

/// Reasons a stored audit cannot be applied to a live record.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransitionError {
    #[error("Expected Auditable type {expected}, got {found} instead")]
    TypeMismatch { expected: String, found: String },

    #[error("Expected Auditable id {expected}, got {found} instead")]
    IdentityMismatch { expected: String, found: String },

    /// A redactor is configured for `attribute`; stored values cannot be reversed.
    #[error("Cannot transition states when an AttributeRedactor is set")]
    IrreversibleModifier { attribute: String },

    /// The stored diff references attributes the live record cannot assign.
    #[error("Incompatibility between [{subject}] and [{audit}]")]
    IncompatibleSchema {
        subject: String,
        audit: String,
        incompatibilities: Vec<String>,
    },

    #[error(transparent)]
    Modifier(#[from] ModifierError),
}

impl TransitionError {
    /// Offending attribute names of an incompatible-schema failure.
    pub fn incompatibilities(&self) -> &[String] {
        match self {
            Self::IncompatibleSchema {
                incompatibilities, ..
            } => incompatibilities,
            _ => &[],
        }
    }
}
