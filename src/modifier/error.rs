//! Modifier error types.

use thiserror::Error;

/// Errors raised while resolving or applying attribute modifiers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModifierError {
    /// The identifier registered for an attribute names no known modifier.
    #[error("Invalid AttributeModifier implementation: {identifier} (attribute '{attribute}')")]
    InvalidModifier {
        attribute: String,
        identifier: String,
    },
}
