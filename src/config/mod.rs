//! Global audit configuration.
//!
//! Values declared by a record's [`AuditSettings`](crate::core::AuditSettings)
//! take precedence; the values here fill in whatever a record leaves unset.
//!
//! ```toml
//! enabled = true
//! console = false
//! strict = false
//! timestamps = false
//! threshold = 200
//! events = ["archived", { pattern = "published", strategy = "getPublishedEventAttributes" }]
//! ```

pub mod error;

pub use error::ConfigError;

use crate::policy::EventEntry;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Process-wide audit defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Master switch for auditing
    pub enabled: bool,

    /// Audit while running as a batch/console process
    pub console: bool,

    /// Exclude hidden attributes from diffs
    pub strict: bool,

    /// Audit timestamp attributes
    pub timestamps: bool,

    /// Audits kept per subject; zero or less keeps all
    pub threshold: i64,

    /// Custom event entries for records that declare none
    pub events: Vec<EventEntry>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            console: false,
            strict: false,
            timestamps: false,
            threshold: 0,
            events: Vec::new(),
        }
    }
}

impl AuditConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
