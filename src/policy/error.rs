//! Policy resolution errors.

use thiserror::Error;

/// Errors raised while deciding how an event is audited.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PolicyError {
    /// No event was set, or the event has no policy entry.
    #[error("A valid audit event has not been set")]
    InvalidEvent,

    /// The policy names a strategy the record does not provide.
    #[error("Unable to handle \"{event}\" event, {strategy}() strategy missing")]
    MissingStrategy { event: String, strategy: String },

    /// An event pattern could not be compiled.
    #[error("Invalid event pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
