//! Immutable audit records.
//!
//! An [`AuditRecord`] is sealed from an [`AuditDraft`] and never changes
//! afterwards. Presentation helpers read it without mutating it.

use super::event::AuditEvent;
use super::subject::SubjectId;
use super::value::{Attributes, Value};
use crate::modifier::{Direction, ModifierError, ModifierPipeline};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Entity that caused a change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: SubjectId,
    #[serde(rename = "type")]
    pub actor_type: String,
}

impl Actor {
    pub fn new(id: impl Into<SubjectId>, actor_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            actor_type: actor_type.into(),
        }
    }
}

/// Request or process metadata captured with an audit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditContext {
    /// Origin URL, or `console` for batch processes.
    pub url: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub group_id: Option<String>,
    pub tags: Vec<String>,
}

/// Mutable audit payload handed to transform hooks before sealing.
#[derive(Clone, Debug, PartialEq)]
pub struct AuditDraft {
    pub event: AuditEvent,
    pub subject_type: String,
    pub subject_id: Option<SubjectId>,
    pub actor: Option<Actor>,
    pub old_values: Attributes,
    pub new_values: Attributes,
    pub context: AuditContext,
    pub created_at: DateTime<Utc>,
}

impl AuditDraft {
    pub fn new(
        event: impl Into<AuditEvent>,
        subject_type: impl Into<String>,
        subject_id: Option<SubjectId>,
    ) -> Self {
        Self {
            event: event.into(),
            subject_type: subject_type.into(),
            subject_id,
            actor: None,
            old_values: Attributes::new(),
            new_values: Attributes::new(),
            context: AuditContext::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_values(mut self, old_values: Attributes, new_values: Attributes) -> Self {
        self.old_values = old_values;
        self.new_values = new_values;
        self
    }

    /// Freeze the draft into an audit record with a fresh id.
    pub fn seal(self) -> AuditRecord {
        AuditRecord {
            id: Uuid::new_v4(),
            event: self.event,
            subject_type: self.subject_type,
            subject_id: self.subject_id,
            actor: self.actor,
            old_values: self.old_values,
            new_values: self.new_values,
            context: self.context,
            created_at: self.created_at,
        }
    }
}

/// Old and new value of one modified attribute.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Modified {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

/// Immutable diff snapshot of one lifecycle event.
///
/// # Example
///
/// ```rust
/// use audit_trail::core::{AuditDraft, AuditEvent, Attributes, Value};
///
/// let mut new_values = Attributes::new();
/// new_values.insert("title".into(), Value::from("A"));
///
/// let audit = AuditDraft::new("created", "articles", Some(1.into()))
///     .with_values(Attributes::new(), new_values)
///     .seal();
///
/// assert_eq!(audit.event(), &AuditEvent::Created);
/// assert!(audit.old_values().is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    id: Uuid,
    event: AuditEvent,
    subject_type: String,
    subject_id: Option<SubjectId>,
    actor: Option<Actor>,
    old_values: Attributes,
    new_values: Attributes,
    context: AuditContext,
    created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn event(&self) -> &AuditEvent {
        &self.event
    }

    pub fn subject_type(&self) -> &str {
        &self.subject_type
    }

    pub fn subject_id(&self) -> Option<&SubjectId> {
        self.subject_id.as_ref()
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    pub fn old_values(&self) -> &Attributes {
        &self.old_values
    }

    pub fn new_values(&self) -> &Attributes {
        &self.new_values
    }

    /// One side of the diff.
    pub fn values(&self, old: bool) -> &Attributes {
        if old {
            &self.old_values
        } else {
            &self.new_values
        }
    }

    pub fn context(&self) -> &AuditContext {
        &self.context
    }

    pub fn tags(&self) -> &[String] {
        &self.context.tags
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Flat metadata view: `audit_*` fields plus the actor.
    pub fn metadata(&self) -> BTreeMap<String, Value> {
        let optional = |v: &Option<String>| Value::from(v.clone());
        let tags = if self.context.tags.is_empty() {
            Value::Null
        } else {
            Value::Text(self.context.tags.join(","))
        };

        let mut metadata = BTreeMap::new();
        metadata.insert("audit_id".into(), Value::Text(self.id.to_string()));
        metadata.insert("audit_event".into(), Value::from(self.event.as_str()));
        metadata.insert("audit_url".into(), optional(&self.context.url));
        metadata.insert("audit_ip_address".into(), optional(&self.context.ip_address));
        metadata.insert("audit_user_agent".into(), optional(&self.context.user_agent));
        metadata.insert("audit_group_id".into(), optional(&self.context.group_id));
        metadata.insert("audit_tags".into(), tags);
        metadata.insert("audit_created_at".into(), Value::from(self.created_at));
        metadata.insert(
            "user_id".into(),
            match &self.actor {
                Some(Actor { id: SubjectId::Int(n), .. }) => Value::Int(*n),
                Some(Actor { id: SubjectId::Str(s), .. }) => Value::Text(s.clone()),
                None => Value::Null,
            },
        );
        metadata.insert(
            "user_type".into(),
            Value::from(self.actor.as_ref().map(|a| a.actor_type.clone())),
        );
        metadata
    }

    /// Attribute-wise view of the diff with encoded values decoded.
    ///
    /// Redacted values are shown as stored.
    pub fn modified(
        &self,
        pipeline: &ModifierPipeline<'_>,
    ) -> Result<BTreeMap<String, Modified>, ModifierError> {
        let mut modified: BTreeMap<String, Modified> = BTreeMap::new();

        for (attribute, value) in &self.new_values {
            let value = pipeline.apply(Direction::Decode, attribute, value.clone())?;
            modified.entry(attribute.clone()).or_default().new = Some(value);
        }
        for (attribute, value) in &self.old_values {
            let value = pipeline.apply(Direction::Decode, attribute, value.clone())?;
            modified.entry(attribute.clone()).or_default().old = Some(value);
        }

        Ok(modified)
    }
}
