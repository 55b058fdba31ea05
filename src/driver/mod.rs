//! Persistence collaborators.
//!
//! The core only produces audit records and prune parameters; storing them
//! is up to an [`AuditDriver`]. [`MemoryDriver`] keeps everything in memory.

pub mod error;

pub use error::DriverError;

use crate::core::{AuditRecord, SubjectId};

/// Bounded delete: keep only the `keep` most recent audits of a subject.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PruneRequest {
    pub subject_type: String,
    pub subject_id: SubjectId,
    pub keep: usize,
}

impl PruneRequest {
    /// Prune parameters for an audit, or `None` when the threshold is
    /// unlimited (zero or less) or the audit has no subject id.
    pub fn for_audit(audit: &AuditRecord, threshold: i64) -> Option<Self> {
        let keep = usize::try_from(threshold).ok().filter(|keep| *keep > 0)?;
        Some(Self {
            subject_type: audit.subject_type().to_string(),
            subject_id: audit.subject_id()?.clone(),
            keep,
        })
    }

    pub fn covers(&self, audit: &AuditRecord) -> bool {
        audit.subject_type() == self.subject_type
            && audit
                .subject_id()
                .is_some_and(|id| id.matches(&self.subject_id))
    }
}

/// Stores audit records and applies retention.
pub trait AuditDriver {
    /// Persist a completed audit record.
    fn audit(&mut self, audit: AuditRecord) -> Result<(), DriverError>;

    /// Drop audits beyond the retention limit. Returns how many were removed.
    fn prune(&mut self, request: &PruneRequest) -> Result<usize, DriverError>;
}

/// In-memory driver, oldest audit first.
#[derive(Clone, Debug, Default)]
pub struct MemoryDriver {
    audits: Vec<AuditRecord>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn audits(&self) -> &[AuditRecord] {
        &self.audits
    }

    /// Audits of one subject, oldest first.
    pub fn audits_for<'a>(
        &'a self,
        subject_type: &'a str,
        subject_id: &'a SubjectId,
    ) -> impl Iterator<Item = &'a AuditRecord> + 'a {
        self.audits.iter().filter(move |audit| {
            audit.subject_type() == subject_type
                && audit.subject_id().is_some_and(|id| id.matches(subject_id))
        })
    }

    pub fn latest(&self) -> Option<&AuditRecord> {
        self.audits.last()
    }

    pub fn len(&self) -> usize {
        self.audits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audits.is_empty()
    }
}

impl AuditDriver for MemoryDriver {
    fn audit(&mut self, audit: AuditRecord) -> Result<(), DriverError> {
        if audit.subject_id().is_none() {
            return Err(DriverError::MissingSubject {
                subject_type: audit.subject_type().to_string(),
            });
        }
        self.audits.push(audit);
        Ok(())
    }

    fn prune(&mut self, request: &PruneRequest) -> Result<usize, DriverError> {
        let total = self.audits.iter().filter(|a| request.covers(a)).count();
        let mut excess = total.saturating_sub(request.keep);
        if excess == 0 {
            return Ok(0);
        }

        let removed = excess;
        self.audits.retain(|audit| {
            if excess > 0 && request.covers(audit) {
                excess -= 1;
                return false;
            }
            true
        });

        tracing::trace!(
            subject_type = %request.subject_type,
            subject_id = %request.subject_id,
            removed,
            "pruned audits"
        );
        Ok(removed)
    }
}
