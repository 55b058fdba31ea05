//! Lifecycle event names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A lifecycle event that can produce an audit record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuditEvent {
    Created,
    Updated,
    Deleted,
    Restored,
    /// Declared, but never audited unless a policy entry asks for it.
    Retrieved,
    Custom(String),
}

impl AuditEvent {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Restored => "restored",
            Self::Retrieved => "retrieved",
            Self::Custom(name) => name,
        }
    }

    /// Events audited without any policy entry.
    pub fn is_default(&self) -> bool {
        matches!(
            self,
            Self::Created | Self::Updated | Self::Deleted | Self::Restored
        )
    }
}

impl From<&str> for AuditEvent {
    fn from(name: &str) -> Self {
        match name {
            "created" => Self::Created,
            "updated" => Self::Updated,
            "deleted" => Self::Deleted,
            "restored" => Self::Restored,
            "retrieved" => Self::Retrieved,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for AuditEvent {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<AuditEvent> for String {
    fn from(event: AuditEvent) -> Self {
        event.as_str().to_string()
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for name in ["created", "updated", "deleted", "restored", "retrieved", "archived"] {
            assert_eq!(AuditEvent::from(name).as_str(), name);
        }
    }

    #[test]
    fn retrieved_is_not_a_default_event() {
        assert!(AuditEvent::Created.is_default());
        assert!(AuditEvent::Restored.is_default());
        assert!(!AuditEvent::Retrieved.is_default());
        assert!(!AuditEvent::from("published").is_default());
    }

    #[test]
    fn serializes_as_plain_name() {
        let json = serde_json::to_string(&AuditEvent::from("archived")).unwrap();
        assert_eq!(json, r#""archived""#);
        let back: AuditEvent = serde_json::from_str(r#""deleted""#).unwrap();
        assert_eq!(back, AuditEvent::Deleted);
    }
}
