//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read configuration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for this schema
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
