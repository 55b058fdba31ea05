//! Versioned archives of audit trails.
//!
//! An [`AuditArchive`] wraps a batch of sealed audit records in a versioned
//! envelope so they can be exported and loaded back as JSON or as compact
//! binary. Loading rejects archives written by another format version.

use crate::core::{AuditRecord, SubjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::ArchiveError;

/// Version identifier for archive format
pub const ARCHIVE_VERSION: u32 = 1;

/// Serializable batch of audit records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditArchive {
    /// Archive format version
    pub version: u32,

    /// Unique archive identifier
    pub id: String,

    /// When the archive was created
    pub archived_at: DateTime<Utc>,

    /// Archived audits, oldest first
    pub audits: Vec<AuditRecord>,
}

impl AuditArchive {
    pub fn new(audits: impl IntoIterator<Item = AuditRecord>) -> Self {
        Self {
            version: ARCHIVE_VERSION,
            id: Uuid::new_v4().to_string(),
            archived_at: Utc::now(),
            audits: audits.into_iter().collect(),
        }
    }

    /// Audits of one subject, oldest first.
    pub fn trail<'a>(
        &'a self,
        subject_type: &'a str,
        subject_id: &'a SubjectId,
    ) -> impl Iterator<Item = &'a AuditRecord> + 'a {
        self.audits.iter().filter(move |audit| {
            audit.subject_type() == subject_type
                && audit.subject_id().is_some_and(|id| id.matches(subject_id))
        })
    }

    pub fn to_json(&self) -> Result<String, ArchiveError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ArchiveError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ArchiveError> {
        let archive: Self = serde_json::from_str(json)
            .map_err(|e| ArchiveError::DeserializationFailed(e.to_string()))?;
        archive.check_version()
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, ArchiveError> {
        bincode::serialize(self).map_err(|e| ArchiveError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let archive: Self = bincode::deserialize(bytes)
            .map_err(|e| ArchiveError::DeserializationFailed(e.to_string()))?;
        archive.check_version()
    }

    fn check_version(self) -> Result<Self, ArchiveError> {
        if self.version != ARCHIVE_VERSION {
            return Err(ArchiveError::UnsupportedVersion {
                found: self.version,
                supported: ARCHIVE_VERSION,
            });
        }
        tracing::trace!(archive_id = %self.id, audits = self.audits.len(), "loaded audit archive");
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Actor, Attributes, AuditDraft, Value};

    fn audits() -> Vec<AuditRecord> {
        let mut old = Attributes::new();
        old.insert("title".into(), Value::from("A"));
        old.insert("reviewed".into(), Value::Int(0));
        let mut new = Attributes::new();
        new.insert("title".into(), Value::from("B"));
        new.insert("published_at".into(), Value::Null);
        new.insert("rating".into(), Value::Float(4.5));

        let mut updated = AuditDraft::new("updated", "articles", Some(1.into()))
            .with_values(old, new);
        updated.actor = Some(Actor::new("u-7", "users"));
        updated.context.tags = vec!["import".into()];

        vec![
            AuditDraft::new("created", "articles", Some(1.into())).seal(),
            updated.seal(),
            AuditDraft::new("created", "articles", Some(2.into())).seal(),
        ]
    }

    #[test]
    fn json_archive_loads_back() {
        let archive = AuditArchive::new(audits());
        let json = archive.to_json().unwrap();
        assert!(json.contains("\"version\": 1"));

        let loaded = AuditArchive::from_json(&json).unwrap();
        assert_eq!(loaded, archive);
    }

    #[test]
    fn binary_archive_loads_back() {
        let archive = AuditArchive::new(audits());
        let bytes = archive.to_binary().unwrap();

        let loaded = AuditArchive::from_binary(&bytes).unwrap();
        assert_eq!(loaded, archive);
    }

    #[test]
    fn rejects_other_versions() {
        let mut archive = AuditArchive::new(audits());
        archive.version = 99;
        let json = serde_json::to_string(&archive).unwrap();

        let err = AuditArchive::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::UnsupportedVersion {
                found: 99,
                supported: ARCHIVE_VERSION
            }
        ));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            AuditArchive::from_json("{not json"),
            Err(ArchiveError::DeserializationFailed(_))
        ));
        assert!(matches!(
            AuditArchive::from_binary(&[1, 2, 3]),
            Err(ArchiveError::DeserializationFailed(_))
        ));
    }

    #[test]
    fn trail_filters_by_subject() {
        let archive = AuditArchive::new(audits());
        let subject = SubjectId::from("1");
        let events: Vec<_> = archive
            .trail("articles", &subject)
            .map(|a| a.event().as_str().to_string())
            .collect();
        assert_eq!(events, vec!["created", "updated"]);
    }
}
