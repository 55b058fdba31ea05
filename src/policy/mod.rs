//! Event policy resolution.
//!
//! Decides whether an event is audited for a record and which strategy
//! produces its before/after attributes:
//! - `created`, `updated`, `deleted` and `restored` always resolve to the
//!   built-in diff strategies
//! - any other event must match an [`EventEntry`], exact or glob, which names
//!   a strategy or lets one be derived as `get<PascalCase>EventAttributes`
//! - strategies are looked up on the record first, then among the built-ins
//!
//! # Example
//!
//! ```rust
//! use audit_trail::config::AuditConfig;
//! use audit_trail::core::{AuditEvent, AuditSettings, TrackedRecord};
//! use audit_trail::policy::{AuditPolicy, ExecutionContext};
//!
//! let record = TrackedRecord::new("articles")
//!     .with_settings(AuditSettings::new().event("*ed"));
//! let policy = AuditPolicy::for_record(&record, &AuditConfig::default()).unwrap();
//! let ctx = ExecutionContext::new();
//!
//! assert!(policy.is_auditable(&AuditEvent::from("archived"), &ctx));
//! assert!(!policy.is_auditable(&AuditEvent::from("publish"), &ctx));
//! ```

mod attributes;
mod context;
pub mod error;
mod pattern;

pub use attributes::AttributeFilter;
pub use context::{ExecutionContext, RestoreScope};
pub use error::PolicyError;
pub use pattern::{strategy_name, EventEntry, EventPattern};

use crate::config::AuditConfig;
use crate::core::{AuditEvent, AuditSettings, Auditable, Diff};

/// Ordered, compiled event entries.
#[derive(Clone, Debug, Default)]
pub struct EventPolicy {
    entries: Vec<(EventPattern, Option<String>)>,
}

impl EventPolicy {
    pub fn new(entries: &[EventEntry]) -> Result<Self, PolicyError> {
        let entries = entries
            .iter()
            .map(|entry| Ok((EventPattern::compile(&entry.pattern)?, entry.strategy.clone())))
            .collect::<Result<Vec<_>, PolicyError>>()?;
        Ok(Self { entries })
    }

    /// Strategy name for an event, or `None` when the event is not audited.
    pub fn resolve(&self, event: &AuditEvent) -> Option<String> {
        let name = event.as_str();
        if name.is_empty() {
            return None;
        }
        if event.is_default() {
            return Some(strategy_name(name));
        }

        self.entries
            .iter()
            .find(|(pattern, _)| pattern.matches(name))
            .map(|(_, strategy)| strategy.clone().unwrap_or_else(|| strategy_name(name)))
    }
}

/// Policy for one audit attempt, read from the record and the global config.
#[derive(Clone, Debug)]
pub struct AuditPolicy {
    settings: AuditSettings,
    events: EventPolicy,
    filter: AttributeFilter,
    threshold: i64,
}

impl AuditPolicy {
    pub fn for_record<R: Auditable>(record: &R, config: &AuditConfig) -> Result<Self, PolicyError> {
        let settings = record.audit_settings();
        let events = EventPolicy::new(settings.events.as_deref().unwrap_or(&config.events))?;
        let filter = AttributeFilter::for_record(record, &settings, config);
        let threshold = settings.threshold.unwrap_or(config.threshold);

        Ok(Self {
            settings,
            events,
            filter,
            threshold,
        })
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    pub fn filter(&self) -> &AttributeFilter {
        &self.filter
    }

    /// Retention limit; zero or less keeps every audit.
    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Whether the event should be audited at all.
    pub fn is_auditable(&self, event: &AuditEvent, ctx: &ExecutionContext) -> bool {
        ctx.permits(event) && self.events.resolve(event).is_some()
    }

    /// Produce the raw before/after attributes for an event.
    pub fn attributes_for<R: Auditable>(
        &self,
        record: &R,
        event: &AuditEvent,
    ) -> Result<Diff, PolicyError> {
        let strategy = self.events.resolve(event).ok_or(PolicyError::InvalidEvent)?;

        if let Some(custom) = record.attribute_strategy(&strategy) {
            return Ok(custom(record));
        }
        if let Some(builtin) = attributes::builtin::<R>(&strategy) {
            return Ok(builtin(record, &self.filter));
        }

        Err(PolicyError::MissingStrategy {
            event: event.to_string(),
            strategy,
        })
    }
}

/// Whether `record` should be audited for `event`.
///
/// Invalid event patterns make a record unauditable.
pub fn is_auditable<R: Auditable>(
    record: &R,
    event: &AuditEvent,
    config: &AuditConfig,
    ctx: &ExecutionContext,
) -> bool {
    AuditPolicy::for_record(record, config).is_ok_and(|policy| policy.is_auditable(event, ctx))
}

/// Raw before/after attributes of `record` for `event`.
pub fn attributes_for<R: Auditable>(
    record: &R,
    event: &AuditEvent,
    config: &AuditConfig,
) -> Result<Diff, PolicyError> {
    AuditPolicy::for_record(record, config)?.attributes_for(record, event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TrackedRecord, Value};

    fn article(settings: AuditSettings) -> TrackedRecord {
        TrackedRecord::new("articles")
            .with_attribute("id", 1)
            .with_attribute("title", "A")
            .with_settings(settings)
            .synced()
    }

    fn policy(record: &TrackedRecord) -> AuditPolicy {
        AuditPolicy::for_record(record, &AuditConfig::default()).unwrap()
    }

    #[test]
    fn default_events_are_ready() {
        let record = article(AuditSettings::new());
        let policy = policy(&record);
        let ctx = ExecutionContext::new();

        for event in ["created", "updated", "deleted", "restored"] {
            assert!(policy.is_auditable(&AuditEvent::from(event), &ctx), "{event}");
        }
    }

    #[test]
    fn retrieved_and_unknown_events_are_not_ready() {
        let record = article(AuditSettings::new());
        let policy = policy(&record);
        let ctx = ExecutionContext::new();

        assert!(!policy.is_auditable(&AuditEvent::Retrieved, &ctx));
        assert!(!policy.is_auditable(&AuditEvent::from("published"), &ctx));
    }

    #[test]
    fn custom_entries_make_events_ready() {
        let record = article(
            AuditSettings::new()
                .event_with("published", "getPublishedEventAttributes")
                .event_with("*ted", "getMultiEventAttributes")
                .event("archived"),
        );
        let policy = policy(&record);
        let ctx = ExecutionContext::new();

        assert!(policy.is_auditable(&AuditEvent::from("published"), &ctx));
        assert!(policy.is_auditable(&AuditEvent::from("archived"), &ctx));
        assert!(policy.is_auditable(&AuditEvent::from("redacted"), &ctx));
        assert!(!policy.is_auditable(&AuditEvent::from("flagged"), &ctx));
    }

    #[test]
    fn glob_entries_resolve_derived_or_named_strategies() {
        let events = EventPolicy::new(&[
            EventEntry::new("*ed"),
            EventEntry::with_strategy("pub*", "getPublishingAttributes"),
        ])
        .unwrap();

        assert_eq!(
            events.resolve(&AuditEvent::from("redacted")).as_deref(),
            Some("getRedactedEventAttributes")
        );
        assert_eq!(
            events.resolve(&AuditEvent::from("publish")).as_deref(),
            Some("getPublishingAttributes")
        );
        assert_eq!(
            events.resolve(&AuditEvent::Created).as_deref(),
            Some("getCreatedEventAttributes")
        );
        assert_eq!(events.resolve(&AuditEvent::from("")), None);
    }

    #[test]
    fn config_events_apply_when_record_declares_none() {
        let record = article(AuditSettings::new());
        let config = AuditConfig {
            events: vec![EventEntry::new("archived")],
            ..AuditConfig::default()
        };
        let policy = AuditPolicy::for_record(&record, &config).unwrap();
        assert!(policy.is_auditable(&AuditEvent::from("archived"), &ExecutionContext::new()));
    }

    #[test]
    fn context_gates_before_policy() {
        let record = article(AuditSettings::new());
        let config = AuditConfig::default();
        let ctx = ExecutionContext::new().in_console(true);

        assert!(!is_auditable(&record, &AuditEvent::Created, &config, &ctx));
        assert!(is_auditable(
            &record,
            &AuditEvent::Created,
            &config,
            &ctx.audit_console(true)
        ));
    }

    #[test]
    fn missing_strategy_names_event_and_strategy() {
        let record = article(AuditSettings::new().event("archived"));
        let err = attributes_for(&record, &AuditEvent::from("archived"), &AuditConfig::default())
            .unwrap_err();

        assert_eq!(
            err,
            PolicyError::MissingStrategy {
                event: "archived".into(),
                strategy: "getArchivedEventAttributes".into(),
            }
        );
        assert_eq!(
            err.to_string(),
            "Unable to handle \"archived\" event, getArchivedEventAttributes() strategy missing"
        );
    }

    #[test]
    fn unresolvable_event_is_invalid() {
        let record = article(AuditSettings::new());
        let err = attributes_for(&record, &AuditEvent::from("published"), &AuditConfig::default())
            .unwrap_err();
        assert_eq!(err, PolicyError::InvalidEvent);
    }

    #[test]
    fn record_strategies_take_precedence() {
        fn archived(record: &TrackedRecord) -> Diff {
            let mut diff = Diff::default();
            diff.new.insert("title".into(), record.get("title").cloned().unwrap_or_default());
            diff
        }

        let record = article(AuditSettings::new().event("archived"))
            .with_strategy("getArchivedEventAttributes", archived);
        let diff = attributes_for(&record, &AuditEvent::from("archived"), &AuditConfig::default())
            .unwrap();

        assert!(diff.old.is_empty());
        assert_eq!(diff.new.get("title"), Some(&Value::from("A")));
    }

    #[test]
    fn retrieved_entry_uses_empty_builtin() {
        let record = article(AuditSettings::new().event("retrieved"));
        let diff =
            attributes_for(&record, &AuditEvent::Retrieved, &AuditConfig::default()).unwrap();
        assert!(diff.is_empty());
    }
}
