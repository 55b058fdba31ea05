//! State transitions from stored audits.
//!
//! A transition applies one side of a stored diff onto a live record,
//! turning it into the state it had before (`old_values`) or right after
//! (`new_values`) the audited event. Values are assigned as pending changes
//! and never persisted here.
//!
//! Checks run in order and the first failure wins:
//! 1. subject type, through the [`TypeAliases`] table
//! 2. subject identity
//! 3. no redactor configured for the record
//! 4. every key of the selected side is assignable on the record
//!
//! A failed transition leaves the record untouched.
//!
//! # Example
//!
//! ```rust
//! use audit_trail::core::{Attributes, AuditDraft, Auditable, TrackedRecord, Value};
//! use audit_trail::modifier::ModifierRegistry;
//! use audit_trail::transition::TransitionEngine;
//!
//! let mut article = TrackedRecord::new("articles")
//!     .with_attribute("id", 1)
//!     .with_attribute("title", "B")
//!     .synced();
//!
//! let mut old = Attributes::new();
//! old.insert("title".into(), Value::from("A"));
//! let audit = AuditDraft::new("updated", "articles", Some(1.into()))
//!     .with_values(old, Attributes::new())
//!     .seal();
//!
//! let registry = ModifierRegistry::default();
//! TransitionEngine::new(&registry)
//!     .transition(&mut article, &audit, true)
//!     .unwrap();
//! assert_eq!(article.get("title"), Some(&Value::from("A")));
//! ```

pub mod error;

pub use error::TransitionError;

use crate::core::{AuditRecord, Auditable};
use crate::modifier::{Direction, ModifierPipeline, ModifierRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Alias to canonical subject type names.
///
/// Stored audits may name their subject by a short alias (`articles`) while
/// live records report a canonical type name, or the other way round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeAliases {
    aliases: BTreeMap<String, String>,
}

impl TypeAliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), canonical.into());
        self
    }

    /// Canonical name for a type, or the name itself when it is no alias.
    pub fn canonical<'a>(&'a self, type_name: &'a str) -> &'a str {
        self.aliases
            .get(type_name)
            .map(String::as_str)
            .unwrap_or(type_name)
    }

    /// First alias registered for a canonical type name.
    pub fn alias_for(&self, canonical: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(_, target)| target.as_str() == canonical)
            .map(|(alias, _)| alias.as_str())
    }

    /// Name a type is reported under: its alias if it has one.
    pub fn label<'a>(&'a self, type_name: &'a str) -> &'a str {
        let canonical = self.canonical(type_name);
        self.alias_for(canonical).unwrap_or(canonical)
    }

    pub fn same_type(&self, a: &str, b: &str) -> bool {
        self.canonical(a) == self.canonical(b)
    }
}

/// Applies stored audits to live records.
#[derive(Clone, Copy, Debug)]
pub struct TransitionEngine<'a> {
    modifiers: &'a ModifierRegistry,
    aliases: Option<&'a TypeAliases>,
}

impl<'a> TransitionEngine<'a> {
    pub fn new(modifiers: &'a ModifierRegistry) -> Self {
        Self {
            modifiers,
            aliases: None,
        }
    }

    pub fn with_aliases(mut self, aliases: &'a TypeAliases) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// Move `record` to the state recorded on one side of `audit`.
    ///
    /// With `old` set the record takes the values it had before the event,
    /// otherwise the values it had right after. Returns the same record so
    /// calls can be chained.
    pub fn transition<'r, R: Auditable>(
        &self,
        record: &'r mut R,
        audit: &AuditRecord,
        old: bool,
    ) -> Result<&'r mut R, TransitionError> {
        match self.apply(record, audit, old) {
            Ok(()) => Ok(record),
            Err(err) => {
                tracing::debug!(
                    audit_id = %audit.id(),
                    subject_type = record.subject_type(),
                    error = %err,
                    "transition rejected"
                );
                Err(err)
            }
        }
    }

    fn apply<R: Auditable>(
        &self,
        record: &mut R,
        audit: &AuditRecord,
        old: bool,
    ) -> Result<(), TransitionError> {
        self.check_type(&*record, audit)?;
        check_identity(&*record, audit)?;

        let settings = record.audit_settings();
        let pipeline = ModifierPipeline::new(self.modifiers, &settings.modifiers);
        if let Some(attribute) = pipeline.first_redacted()? {
            return Err(TransitionError::IrreversibleModifier {
                attribute: attribute.to_string(),
            });
        }

        let values = audit.values(old);
        self.check_compatibility(&*record, audit, values.keys())?;

        let decoded = pipeline.apply_all(Direction::Decode, values.clone())?;
        let applied = decoded.len();
        for (attribute, value) in decoded {
            record.set_attribute(&attribute, value);
        }

        tracing::debug!(
            audit_id = %audit.id(),
            subject_type = record.subject_type(),
            side = if old { "old" } else { "new" },
            applied,
            "transition applied"
        );
        Ok(())
    }

    fn check_type<R: Auditable>(
        &self,
        record: &R,
        audit: &AuditRecord,
    ) -> Result<(), TransitionError> {
        let live = record.subject_type();
        let stored = audit.subject_type();
        let matched = match self.aliases {
            Some(aliases) => aliases.same_type(live, stored),
            None => live == stored,
        };
        if matched {
            return Ok(());
        }

        let expected = self.aliases.map_or(live, |aliases| aliases.label(live));
        Err(TransitionError::TypeMismatch {
            expected: expected.to_string(),
            found: stored.to_string(),
        })
    }

    fn check_compatibility<'k, R: Auditable>(
        &self,
        record: &R,
        audit: &AuditRecord,
        keys: impl Iterator<Item = &'k String>,
    ) -> Result<(), TransitionError> {
        let checks: Vec<Validation<(), NonEmptyVec<String>>> = keys
            .map(|key| {
                if record.is_assignable(key) {
                    Validation::success(())
                } else {
                    Validation::fail(key.clone())
                }
            })
            .collect();

        match Validation::all_vec(checks) {
            Validation::Success(_) => Ok(()),
            Validation::Failure(keys) => Err(TransitionError::IncompatibleSchema {
                subject: format!(
                    "{}:{}",
                    record.subject_type(),
                    display_id(record.subject_id().as_ref())
                ),
                audit: format!("Audit:{}", audit.id()),
                incompatibilities: keys.iter().cloned().collect(),
            }),
        }
    }
}

fn check_identity<R: Auditable>(record: &R, audit: &AuditRecord) -> Result<(), TransitionError> {
    let live = record.subject_id();
    let stored = audit.subject_id();

    match (&live, stored) {
        (Some(live), Some(stored)) if live.matches(stored) => Ok(()),
        _ => Err(TransitionError::IdentityMismatch {
            expected: display_id(live.as_ref()),
            found: display_id(stored),
        }),
    }
}

fn display_id(id: Option<&crate::core::SubjectId>) -> String {
    id.map_or_else(|| "null".to_string(), ToString::to_string)
}
