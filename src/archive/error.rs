//! Archive error types.

use thiserror::Error;

/// Errors that can occur while archiving or loading audit trails
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Serialization to JSON or binary format failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization from JSON or binary format failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Archive was written by an unsupported format version
    #[error("Unsupported archive version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}
