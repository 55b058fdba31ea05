//! Audit record construction.
//!
//! [`AuditBuilder`] turns a tracked record and an event into an immutable
//! [`AuditRecord`]:
//! 1. resolve the event policy and compute the raw diff
//! 2. encode every value through the record's modifier pipeline
//! 3. resolve actor and request context, generate tags
//! 4. hand the draft to the record's transform hook, then seal it
//!
//! Construction is atomic: on any error no record is produced.

pub mod error;
pub mod resolver;

pub use error::AuditError;
pub use resolver::{ContextResolver, Fixed, HeaderResolver, Resolvers, UserResolver};

use crate::config::AuditConfig;
use crate::core::{AuditDraft, AuditEvent, AuditRecord, Auditable};
use crate::modifier::{Direction, ModifierPipeline, ModifierRegistry};
use crate::policy::{AuditPolicy, PolicyError};
use std::sync::Arc;

fn required<T: ?Sized>(resolver: &Option<Arc<T>>, name: &str) -> Result<Arc<T>, AuditError> {
    resolver.clone().ok_or_else(|| AuditError::InvalidResolver {
        resolver: name.to_string(),
    })
}

/// Builder for a single audit record.
pub struct AuditBuilder<'a, R: Auditable> {
    record: &'a R,
    config: &'a AuditConfig,
    resolvers: &'a Resolvers,
    modifiers: &'a ModifierRegistry,
    event: Option<AuditEvent>,
}

impl<'a, R: Auditable> AuditBuilder<'a, R> {
    pub fn new(
        record: &'a R,
        config: &'a AuditConfig,
        resolvers: &'a Resolvers,
        modifiers: &'a ModifierRegistry,
    ) -> Self {
        Self {
            record,
            config,
            resolvers,
            modifiers,
            event: None,
        }
    }

    /// Set the event to audit (required).
    pub fn event(mut self, event: impl Into<AuditEvent>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Build the audit record.
    pub fn build(self) -> Result<AuditRecord, AuditError> {
        let event = self.event.ok_or(PolicyError::InvalidEvent)?;
        let policy = AuditPolicy::for_record(self.record, self.config)?;
        let diff = policy.attributes_for(self.record, &event)?;

        let pipeline = ModifierPipeline::new(self.modifiers, &policy.settings().modifiers);
        let old_values = pipeline.apply_all(Direction::Encode, diff.old)?;
        let new_values = pipeline.apply_all(Direction::Encode, diff.new)?;

        let tags = self.record.generate_tags();
        let actor = required(&self.resolvers.user, "UserResolver")?.resolve();
        let url = required(&self.resolvers.url, "UrlResolver")?.resolve();
        let ip_address = required(&self.resolvers.ip_address, "IpAddressResolver")?.resolve();
        let user_agent = required(&self.resolvers.user_agent, "UserAgentResolver")?.resolve();
        let group_id = self.resolvers.group.as_ref().and_then(|g| g.resolve());

        let mut draft = AuditDraft::new(
            event,
            self.record.subject_type(),
            self.record.subject_id(),
        )
        .with_values(old_values, new_values);
        draft.actor = actor;
        draft.context.url = url;
        draft.context.ip_address = ip_address;
        draft.context.user_agent = user_agent;
        draft.context.group_id = group_id;
        draft.context.tags = tags;

        let audit = self.record.transform_audit(draft).seal();
        tracing::debug!(
            audit_id = %audit.id(),
            event = %audit.event(),
            subject_type = audit.subject_type(),
            changed = audit.new_values().len().max(audit.old_values().len()),
            "built audit record"
        );
        Ok(audit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Actor, AuditSettings, Diff, TrackedRecord, Value};
    use crate::modifier::{ModifierError, BASE64_ENCODER, LEFT_REDACTOR, RIGHT_REDACTOR};

    struct Env {
        config: AuditConfig,
        resolvers: Resolvers,
        modifiers: ModifierRegistry,
    }

    impl Env {
        fn new() -> Self {
            Self {
                config: AuditConfig::default(),
                resolvers: Resolvers::console(),
                modifiers: ModifierRegistry::default(),
            }
        }

        fn build(&self, record: &TrackedRecord, event: &str) -> Result<AuditRecord, AuditError> {
            AuditBuilder::new(record, &self.config, &self.resolvers, &self.modifiers)
                .event(event)
                .build()
        }
    }

    fn article() -> TrackedRecord {
        TrackedRecord::new("articles")
            .with_attribute("id", 1)
            .with_attribute("title", "How To Audit Models")
            .with_attribute("content", "N/A")
            .with_attribute("reviewed", 0)
            .with_attribute("published_at", Value::Null)
            .synced()
    }

    #[test]
    fn created_audit_carries_all_audited_values() {
        let env = Env::new();
        let audit = env.build(&article(), "created").unwrap();

        assert_eq!(audit.event(), &AuditEvent::Created);
        assert!(audit.old_values().is_empty());
        assert_eq!(audit.new_values().len(), 4);
        assert_eq!(audit.subject_type(), "articles");
        assert_eq!(audit.context().url.as_deref(), Some("console"));
        assert_eq!(audit.context().ip_address.as_deref(), Some("127.0.0.1"));
        assert_eq!(audit.actor(), None);
        assert!(audit.tags().is_empty());
    }

    #[test]
    fn missing_event_is_invalid() {
        let env = Env::new();
        let record = article();
        let err = AuditBuilder::new(&record, &env.config, &env.resolvers, &env.modifiers)
            .build()
            .unwrap_err();

        assert_eq!(err, AuditError::Policy(PolicyError::InvalidEvent));
        assert_eq!(err.to_string(), "A valid audit event has not been set");
    }

    #[test]
    fn unmapped_custom_event_is_invalid() {
        let env = Env::new();
        let err = env.build(&article(), "published").unwrap_err();
        assert_eq!(err, AuditError::Policy(PolicyError::InvalidEvent));
    }

    #[test]
    fn mapped_custom_events_without_strategy_fail() {
        let env = Env::new();
        let cases = [
            (
                "published",
                AuditSettings::new().event_with("published", "getPublishedEventAttributes"),
                "getPublishedEventAttributes",
            ),
            ("archived", AuditSettings::new().event("archived"), "getArchivedEventAttributes"),
            ("redacted", AuditSettings::new().event("*ed"), "getRedactedEventAttributes"),
            (
                "redacted",
                AuditSettings::new().event_with("*ed", "getMultiEventAttributes"),
                "getMultiEventAttributes",
            ),
        ];

        for (event, settings, strategy) in cases {
            let record = article().with_settings(settings);
            let err = env.build(&record, event).unwrap_err();
            assert_eq!(
                err,
                AuditError::Policy(PolicyError::MissingStrategy {
                    event: event.into(),
                    strategy: strategy.into(),
                })
            );
        }
    }

    #[test]
    fn each_missing_resolver_is_reported() {
        let full = Resolvers::console();
        let cases = [
            ("UserResolver", Resolvers { user: None, ..full.clone() }),
            ("UrlResolver", Resolvers { url: None, ..full.clone() }),
            ("IpAddressResolver", Resolvers { ip_address: None, ..full.clone() }),
            ("UserAgentResolver", Resolvers { user_agent: None, ..full.clone() }),
        ];

        for (name, resolvers) in cases {
            let env = Env {
                resolvers,
                ..Env::new()
            };
            let err = env.build(&article(), "created").unwrap_err();
            assert_eq!(err.to_string(), format!("Invalid {name} implementation"));
        }
    }

    #[test]
    fn resolved_actor_and_group_are_recorded() {
        let env = Env {
            resolvers: Resolvers::console()
                .user(|| Some(Actor::new(1, "users")))
                .group(Fixed::text("7")),
            ..Env::new()
        };
        let audit = env.build(&article(), "created").unwrap();

        assert_eq!(audit.actor(), Some(&Actor::new(1, "users")));
        assert_eq!(audit.context().group_id.as_deref(), Some("7"));
    }

    #[test]
    fn modifiers_apply_to_both_sides() {
        let env = Env::new();
        let mut record = article().with_settings(
            AuditSettings::new()
                .modifier("title", RIGHT_REDACTOR)
                .modifier("content", LEFT_REDACTOR)
                .modifier("reviewed", BASE64_ENCODER),
        );
        record.set_attribute("title", Value::from("How To Audit Eloquent Models"));
        record.set_attribute(
            "content",
            Value::from("First step: install the laravel-auditing package."),
        );
        record.set_attribute("reviewed", Value::from(1));
        record.set_attribute("published_at", Value::from("2024-05-01 10:00:00"));

        let audit = env.build(&record, "updated").unwrap();
        let old = audit.old_values();
        let new = audit.new_values();

        assert_eq!(old.get("title"), Some(&Value::from("Ho#################")));
        assert_eq!(old.get("content"), Some(&Value::from("##A")));
        assert_eq!(old.get("reviewed"), Some(&Value::from("int:MA==")));
        assert_eq!(old.get("published_at"), Some(&Value::Null));
        assert_eq!(new.get("title"), Some(&Value::from("How#########################")));
        assert_eq!(
            new.get("content"),
            Some(&Value::from("############################################kage."))
        );
        assert_eq!(new.get("reviewed"), Some(&Value::from("int:MQ==")));
        assert_eq!(new.get("published_at"), Some(&Value::from("2024-05-01 10:00:00")));
    }

    #[test]
    fn unknown_modifier_aborts_build() {
        let env = Env::new();
        let record = article().with_settings(
            AuditSettings::new().modifier("title", "invalidAttributeRedactorOrEncoder"),
        );
        let err = env.build(&record, "created").unwrap_err();

        assert!(matches!(
            err,
            AuditError::Modifier(ModifierError::InvalidModifier { ref identifier, .. })
                if identifier == "invalidAttributeRedactorOrEncoder"
        ));
    }

    #[test]
    fn transform_hook_reshapes_payload() {
        fn add_slug(mut draft: AuditDraft) -> AuditDraft {
            let slug = draft
                .new_values
                .get("title")
                .and_then(Value::as_str)
                .map(|t| t.to_lowercase().replace(' ', "-"));
            draft.new_values.insert("slug".into(), Value::from(slug));
            draft
        }

        let env = Env::new();
        let record = article().with_transform(add_slug);
        let audit = env.build(&record, "created").unwrap();

        assert_eq!(
            audit.new_values().get("slug"),
            Some(&Value::from("how-to-audit-models"))
        );
    }

    #[test]
    fn tags_come_from_the_record() {
        let env = Env::new();
        let record = article().with_tags(["foo", "bar"]);
        let audit = env.build(&record, "created").unwrap();
        assert_eq!(audit.tags(), ["foo".to_string(), "bar".to_string()]);
    }

    #[test]
    fn update_without_changes_still_builds() {
        let env = Env::new();
        let audit = env.build(&article(), "updated").unwrap();
        assert!(audit.old_values().is_empty());
        assert!(audit.new_values().is_empty());
    }

    #[test]
    fn custom_strategy_output_is_encoded() {
        fn archived(record: &TrackedRecord) -> Diff {
            let mut diff = Diff::default();
            diff.old.insert("reviewed".into(), record.get("reviewed").cloned().unwrap_or_default());
            diff.new.insert("reviewed".into(), Value::from(2));
            diff
        }

        let env = Env::new();
        let record = article()
            .with_settings(
                AuditSettings::new()
                    .event("archived")
                    .modifier("reviewed", BASE64_ENCODER),
            )
            .with_strategy("getArchivedEventAttributes", archived);
        let audit = env.build(&record, "archived").unwrap();

        assert_eq!(audit.event().as_str(), "archived");
        assert_eq!(audit.old_values().get("reviewed"), Some(&Value::from("int:MA==")));
        assert_eq!(audit.new_values().get("reviewed"), Some(&Value::from("int:Mg==")));
    }
}
