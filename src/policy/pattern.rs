//! Event name patterns.
//!
//! Patterns are exact names or globs where `*` stands for any run of
//! characters. Globs are compiled once into anchored regular expressions.

use super::error::PolicyError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A compiled event-name pattern.
#[derive(Clone, Debug)]
pub struct EventPattern {
    source: String,
    glob: Option<Regex>,
}

impl EventPattern {
    pub fn compile(pattern: &str) -> Result<Self, PolicyError> {
        if !pattern.contains('*') {
            return Ok(Self {
                source: pattern.to_string(),
                glob: None,
            });
        }

        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let glob = Regex::new(&format!("^{body}$")).map_err(|e| PolicyError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            source: pattern.to_string(),
            glob: Some(glob),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_glob(&self) -> bool {
        self.glob.is_some()
    }

    pub fn matches(&self, event: &str) -> bool {
        match &self.glob {
            Some(glob) => glob.is_match(event),
            None => self.source == event,
        }
    }
}

/// One entry of an event policy: a pattern and, optionally, the name of
/// the strategy that produces its attributes.
///
/// Deserializes from either a bare string (`"archived"`) or a table
/// (`{ pattern = "published", strategy = "getPublishedEventAttributes" }`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEntry")]
pub struct EventEntry {
    pub pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl EventEntry {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            strategy: None,
        }
    }

    pub fn with_strategy(pattern: impl Into<String>, strategy: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            strategy: Some(strategy.into()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Name(String),
    Table {
        pattern: String,
        #[serde(default)]
        strategy: Option<String>,
    },
}

impl From<RawEntry> for EventEntry {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Name(pattern) => Self::new(pattern),
            RawEntry::Table { pattern, strategy } => Self { pattern, strategy },
        }
    }
}

/// Conventional strategy name for an event: `get<PascalCase>EventAttributes`.
pub fn strategy_name(event: &str) -> String {
    let pascal: String = event
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    format!("get{pascal}EventAttributes")
}
