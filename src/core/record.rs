//! The tracked-record capability surface.
//!
//! Anything that implements [`Auditable`] can be diffed into audit records
//! and transitioned back to a historical state. [`TrackedRecord`] is a
//! ready-made implementation backed by attribute maps, handy for dynamic
//! schemas and for tests.

use super::audit::AuditDraft;
use super::subject::SubjectId;
use super::value::{Attributes, Value};
use crate::policy::EventEntry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Attribute names treated as timestamps unless timestamp auditing is on.
pub const DEFAULT_TIMESTAMPS: [&str; 3] = ["created_at", "updated_at", "deleted_at"];

/// Before/after attribute values produced for one event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diff {
    pub old: Attributes,
    pub new: Attributes,
}

impl Diff {
    pub fn new(old: Attributes, new: Attributes) -> Self {
        Self { old, new }
    }

    pub fn is_empty(&self) -> bool {
        self.old.is_empty() && self.new.is_empty()
    }
}

/// Statically resolvable attribute-producing strategy for an event.
pub type AttributeStrategy<R> = fn(&R) -> Diff;

/// Audit configuration declared by a record type.
///
/// Unset options fall back to the global [`AuditConfig`](crate::config::AuditConfig).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub strict: Option<bool>,
    pub timestamps: Option<bool>,
    pub threshold: Option<i64>,
    pub events: Option<Vec<EventEntry>>,
    pub modifiers: BTreeMap<String, String>,
}

impl AuditSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclude<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    pub fn threshold(mut self, threshold: i64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Add an event entry whose strategy name is derived from the event.
    pub fn event(mut self, pattern: impl Into<String>) -> Self {
        self.events
            .get_or_insert_with(Vec::new)
            .push(EventEntry::new(pattern));
        self
    }

    /// Add an event entry bound to a named strategy.
    pub fn event_with(mut self, pattern: impl Into<String>, strategy: impl Into<String>) -> Self {
        self.events
            .get_or_insert_with(Vec::new)
            .push(EventEntry::with_strategy(pattern, strategy));
        self
    }

    /// Register a modifier identifier for an attribute.
    pub fn modifier(mut self, attribute: impl Into<String>, identifier: impl Into<String>) -> Self {
        self.modifiers.insert(attribute.into(), identifier.into());
        self
    }
}

/// A mutable entity whose changes are audited.
pub trait Auditable {
    /// Type name stored as the audit subject type.
    fn subject_type(&self) -> &str;

    /// Current attribute values.
    fn attributes(&self) -> &Attributes;

    /// Attribute values as last synchronized with storage.
    fn original(&self) -> &Attributes;

    /// Assign an attribute as a pending change.
    fn set_attribute(&mut self, attribute: &str, value: Value);

    /// Name of the primary key attribute.
    fn key_name(&self) -> &str {
        "id"
    }

    /// Identity of the record, read from its primary key attribute.
    fn subject_id(&self) -> Option<SubjectId> {
        match self.attributes().get(self.key_name())? {
            Value::Int(n) => Some(SubjectId::Int(*n)),
            Value::Text(s) => Some(SubjectId::Str(s.clone())),
            _ => None,
        }
    }

    /// Whether an attribute can be assigned on this record.
    fn is_assignable(&self, attribute: &str) -> bool {
        self.attributes().contains_key(attribute)
    }

    /// Pending changes: current values that differ from the original ones.
    fn dirty(&self) -> Attributes {
        let original = self.original();
        self.attributes()
            .iter()
            .filter(|(key, value)| original.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Attributes hidden from default presentation.
    fn hidden(&self) -> &[String] {
        &[]
    }

    /// Attributes explicitly visible in default presentation.
    fn visible(&self) -> &[String] {
        &[]
    }

    fn timestamp_attributes(&self) -> &[&str] {
        &DEFAULT_TIMESTAMPS
    }

    fn audit_settings(&self) -> AuditSettings {
        AuditSettings::default()
    }

    fn generate_tags(&self) -> Vec<String> {
        Vec::new()
    }

    /// Last chance to reshape an audit before it is sealed.
    fn transform_audit(&self, draft: AuditDraft) -> AuditDraft {
        draft
    }

    /// Look up a custom attribute strategy by name.
    fn attribute_strategy(&self, _name: &str) -> Option<AttributeStrategy<Self>>
    where
        Self: Sized,
    {
        None
    }
}

/// Map-backed [`Auditable`] implementation.
///
/// # Example
///
/// ```rust
/// use audit_trail::core::{Auditable, TrackedRecord, Value};
///
/// let mut article = TrackedRecord::new("articles")
///     .with_attribute("id", 1)
///     .with_attribute("title", "A")
///     .synced();
///
/// article.set_attribute("title", Value::from("B"));
/// assert_eq!(article.dirty().get("title"), Some(&Value::from("B")));
/// ```
#[derive(Clone)]
pub struct TrackedRecord {
    subject_type: String,
    key_name: String,
    attributes: Attributes,
    original: Attributes,
    hidden: Vec<String>,
    visible: Vec<String>,
    settings: AuditSettings,
    tags: Vec<String>,
    strategies: HashMap<String, AttributeStrategy<TrackedRecord>>,
    transform: Option<fn(AuditDraft) -> AuditDraft>,
}

impl TrackedRecord {
    pub fn new(subject_type: impl Into<String>) -> Self {
        Self {
            subject_type: subject_type.into(),
            key_name: "id".to_string(),
            attributes: Attributes::new(),
            original: Attributes::new(),
            hidden: Vec::new(),
            visible: Vec::new(),
            settings: AuditSettings::default(),
            tags: Vec::new(),
            strategies: HashMap::new(),
            transform: None,
        }
    }

    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = key_name.into();
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    pub fn with_hidden<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_visible<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.visible = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_settings(mut self, settings: AuditSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Register a named attribute strategy for custom events.
    pub fn with_strategy(
        mut self,
        name: impl Into<String>,
        strategy: AttributeStrategy<Self>,
    ) -> Self {
        self.strategies.insert(name.into(), strategy);
        self
    }

    pub fn with_transform(mut self, transform: fn(AuditDraft) -> AuditDraft) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Mark the current attributes as persisted.
    pub fn synced(mut self) -> Self {
        self.sync_original();
        self
    }

    pub fn sync_original(&mut self) {
        self.original = self.attributes.clone();
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// Drop an attribute from the record's schema.
    pub fn remove_attribute(&mut self, attribute: &str) -> Option<Value> {
        self.original.remove(attribute);
        self.attributes.remove(attribute)
    }
}

impl fmt::Debug for TrackedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedRecord")
            .field("subject_type", &self.subject_type)
            .field("key_name", &self.key_name)
            .field("attributes", &self.attributes)
            .field("original", &self.original)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Auditable for TrackedRecord {
    fn subject_type(&self) -> &str {
        &self.subject_type
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn original(&self) -> &Attributes {
        &self.original
    }

    fn set_attribute(&mut self, attribute: &str, value: Value) {
        self.attributes.insert(attribute.to_string(), value);
    }

    fn key_name(&self) -> &str {
        &self.key_name
    }

    fn hidden(&self) -> &[String] {
        &self.hidden
    }

    fn visible(&self) -> &[String] {
        &self.visible
    }

    fn audit_settings(&self) -> AuditSettings {
        self.settings.clone()
    }

    fn generate_tags(&self) -> Vec<String> {
        self.tags.clone()
    }

    fn transform_audit(&self, draft: AuditDraft) -> AuditDraft {
        match self.transform {
            Some(transform) => transform(draft),
            None => draft,
        }
    }

    fn attribute_strategy(&self, name: &str) -> Option<AttributeStrategy<Self>> {
        self.strategies.get(name).copied()
    }
}
