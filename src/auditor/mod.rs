//! Auditing entry points.
//!
//! [`Auditor`] bundles the global configuration with the injected
//! collaborators and runs the full flow for one event: gate, build, store,
//! prune. [`Observer`] maps record lifecycle hooks onto it and keeps a
//! restore from also producing an `updated` audit.

pub mod error;

pub use error::AuditorError;

use crate::builder::{AuditBuilder, Resolvers};
use crate::config::AuditConfig;
use crate::core::{AuditEvent, AuditRecord, Auditable, Modified};
use crate::driver::{AuditDriver, PruneRequest};
use crate::modifier::{ModifierError, ModifierPipeline, ModifierRegistry};
use crate::policy::{AuditPolicy, ExecutionContext};
use crate::transition::{TransitionEngine, TransitionError, TypeAliases};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Configured auditing facade.
///
/// # Example
///
/// ```rust
/// use audit_trail::auditor::Auditor;
/// use audit_trail::config::AuditConfig;
/// use audit_trail::core::{AuditEvent, TrackedRecord};
/// use audit_trail::driver::MemoryDriver;
///
/// let auditor = Auditor::new(AuditConfig::default());
/// let article = TrackedRecord::new("articles")
///     .with_attribute("id", 1)
///     .with_attribute("title", "A")
///     .synced();
///
/// let mut driver = MemoryDriver::new();
/// let ctx = auditor.context();
/// let stored = auditor
///     .execute(&article, AuditEvent::Created, &ctx, &mut driver)
///     .unwrap();
///
/// assert!(stored.is_some());
/// assert_eq!(driver.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct Auditor {
    config: AuditConfig,
    resolvers: Resolvers,
    modifiers: ModifierRegistry,
    aliases: TypeAliases,
}

impl Auditor {
    /// Auditor with console resolvers and the stock modifiers.
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config,
            resolvers: Resolvers::console(),
            modifiers: ModifierRegistry::default(),
            aliases: TypeAliases::default(),
        }
    }

    pub fn with_resolvers(mut self, resolvers: Resolvers) -> Self {
        self.resolvers = resolvers;
        self
    }

    pub fn with_modifiers(mut self, modifiers: ModifierRegistry) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_aliases(mut self, aliases: TypeAliases) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn modifiers(&self) -> &ModifierRegistry {
        &self.modifiers
    }

    /// Execution context seeded from the global configuration.
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::from_config(&self.config)
    }

    pub fn builder<'a, R: Auditable>(&'a self, record: &'a R) -> AuditBuilder<'a, R> {
        AuditBuilder::new(record, &self.config, &self.resolvers, &self.modifiers)
    }

    pub fn transition_engine(&self) -> TransitionEngine<'_> {
        TransitionEngine::new(&self.modifiers).with_aliases(&self.aliases)
    }

    /// Audit one event: gate it, build the record, store it, then prune.
    ///
    /// Returns the stored audit's id, or `None` when the event is not audited.
    pub fn execute<R, D>(
        &self,
        record: &R,
        event: impl Into<AuditEvent>,
        ctx: &ExecutionContext,
        driver: &mut D,
    ) -> Result<Option<Uuid>, AuditorError>
    where
        R: Auditable,
        D: AuditDriver + ?Sized,
    {
        let event = event.into();
        let policy = AuditPolicy::for_record(record, &self.config)?;
        if !policy.is_auditable(&event, ctx) {
            tracing::trace!(
                event = %event,
                subject_type = record.subject_type(),
                "event not audited"
            );
            return Ok(None);
        }

        let audit = self.builder(record).event(event).build()?;
        let id = audit.id();
        let prune = PruneRequest::for_audit(&audit, policy.threshold());

        driver.audit(audit)?;
        if let Some(request) = prune {
            driver.prune(&request)?;
        }
        Ok(Some(id))
    }

    /// Apply one side of a stored audit to `record`, returning it.
    pub fn transition<'r, R: Auditable>(
        &self,
        record: &'r mut R,
        audit: &AuditRecord,
        old: bool,
    ) -> Result<&'r mut R, TransitionError> {
        self.transition_engine().transition(record, audit, old)
    }

    /// Attribute-wise view of a stored audit, decoded with the record's modifiers.
    pub fn modified<R: Auditable>(
        &self,
        record: &R,
        audit: &AuditRecord,
    ) -> Result<BTreeMap<String, Modified>, ModifierError> {
        let settings = record.audit_settings();
        audit.modified(&ModifierPipeline::new(&self.modifiers, &settings.modifiers))
    }
}

/// Lifecycle hooks of tracked records, each auditing its event.
pub struct Observer<'a, D: AuditDriver + ?Sized> {
    auditor: &'a Auditor,
    driver: &'a mut D,
}

impl<'a, D: AuditDriver + ?Sized> Observer<'a, D> {
    pub fn new(auditor: &'a Auditor, driver: &'a mut D) -> Self {
        Self { auditor, driver }
    }

    pub fn retrieved<R: Auditable>(
        &mut self,
        ctx: &ExecutionContext,
        record: &R,
    ) -> Result<Option<Uuid>, AuditorError> {
        self.auditor.execute(record, AuditEvent::Retrieved, ctx, &mut *self.driver)
    }

    pub fn created<R: Auditable>(
        &mut self,
        ctx: &ExecutionContext,
        record: &R,
    ) -> Result<Option<Uuid>, AuditorError> {
        self.auditor.execute(record, AuditEvent::Created, ctx, &mut *self.driver)
    }

    /// Skipped while a restore is in progress.
    pub fn updated<R: Auditable>(
        &mut self,
        ctx: &ExecutionContext,
        record: &R,
    ) -> Result<Option<Uuid>, AuditorError> {
        self.auditor.execute(record, AuditEvent::Updated, ctx, &mut *self.driver)
    }

    pub fn deleted<R: Auditable>(
        &mut self,
        ctx: &ExecutionContext,
        record: &R,
    ) -> Result<Option<Uuid>, AuditorError> {
        self.auditor.execute(record, AuditEvent::Deleted, ctx, &mut *self.driver)
    }

    /// Run a restore write and audit it as `restored`.
    ///
    /// `write` performs the restore and may fire further hooks; `updated`
    /// hooks fired with the context it receives are ignored. The restoring
    /// flag is reset when this returns, whether or not the write fails.
    pub fn restore<R, F>(
        &mut self,
        ctx: &mut ExecutionContext,
        record: &mut R,
        write: F,
    ) -> Result<Option<Uuid>, AuditorError>
    where
        R: Auditable,
        F: FnOnce(&mut Self, &ExecutionContext, &mut R) -> Result<(), AuditorError>,
    {
        let scope = ctx.begin_restore();
        write(self, &scope, record)?;
        self.auditor.execute(&*record, AuditEvent::Restored, &scope, &mut *self.driver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AuditSettings, TrackedRecord, Value};
    use crate::driver::{DriverError, MemoryDriver};
    use crate::modifier::BASE64_ENCODER;

    fn article() -> TrackedRecord {
        TrackedRecord::new("articles")
            .with_attribute("id", 1)
            .with_attribute("title", "A")
            .with_attribute("reviewed", 0)
            .synced()
    }

    #[test]
    fn execute_stores_audits_for_default_events() {
        let auditor = Auditor::new(AuditConfig::default());
        let mut driver = MemoryDriver::new();
        let ctx = auditor.context();

        let id = auditor
            .execute(&article(), AuditEvent::Created, &ctx, &mut driver)
            .unwrap();

        assert_eq!(driver.latest().map(AuditRecord::id), id);
        assert_eq!(driver.latest().map(|a| a.new_values().len()), Some(2));
    }

    #[test]
    fn execute_skips_gated_events() {
        let auditor = Auditor::new(AuditConfig {
            enabled: false,
            ..AuditConfig::default()
        });
        let mut driver = MemoryDriver::new();
        let ctx = auditor.context();

        let id = auditor
            .execute(&article(), AuditEvent::Created, &ctx, &mut driver)
            .unwrap();
        assert_eq!(id, None);

        let ctx = ExecutionContext::new();
        let id = auditor
            .execute(&article(), AuditEvent::Retrieved, &ctx, &mut driver)
            .unwrap();
        assert_eq!(id, None);
        assert!(driver.is_empty());
    }

    #[test]
    fn execute_prunes_beyond_threshold() {
        let auditor = Auditor::new(AuditConfig {
            threshold: 2,
            ..AuditConfig::default()
        });
        let mut driver = MemoryDriver::new();
        let ctx = auditor.context();
        let mut record = article();

        for n in 0..5 {
            record.set_attribute("title", Value::from(format!("T{n}")));
            auditor
                .execute(&record, AuditEvent::Updated, &ctx, &mut driver)
                .unwrap();
        }

        assert_eq!(driver.len(), 2);
        let titles: Vec<_> = driver
            .audits()
            .iter()
            .filter_map(|a| a.new_values().get("title").cloned())
            .collect();
        assert_eq!(titles, vec![Value::from("T3"), Value::from("T4")]);
    }

    #[test]
    fn record_threshold_overrides_config() {
        let auditor = Auditor::new(AuditConfig {
            threshold: 1,
            ..AuditConfig::default()
        });
        let mut driver = MemoryDriver::new();
        let ctx = auditor.context();
        let record = article().with_settings(AuditSettings::new().threshold(0));

        for _ in 0..3 {
            auditor
                .execute(&record, AuditEvent::Created, &ctx, &mut driver)
                .unwrap();
        }
        assert_eq!(driver.len(), 3);
    }

    #[test]
    fn driver_errors_surface() {
        let auditor = Auditor::new(AuditConfig::default());
        let mut driver = MemoryDriver::new();
        let ctx = auditor.context();
        let unsaved = TrackedRecord::new("articles").with_attribute("title", "A");

        let err = auditor
            .execute(&unsaved, AuditEvent::Created, &ctx, &mut driver)
            .unwrap_err();
        assert!(matches!(
            err,
            AuditorError::Driver(DriverError::MissingSubject { .. })
        ));
    }

    #[test]
    fn restore_suppresses_nested_update() {
        let auditor = Auditor::new(AuditConfig::default());
        let mut driver = MemoryDriver::new();
        let mut ctx = auditor.context();
        let mut record = article();

        {
            let mut observer = Observer::new(&auditor, &mut driver);
            observer
                .restore(&mut ctx, &mut record, |observer, ctx, record| {
                    record.set_attribute("deleted_at", Value::Null);
                    let skipped = observer.updated(ctx, &*record)?;
                    assert_eq!(skipped, None);
                    Ok(())
                })
                .unwrap();
        }

        assert!(!ctx.is_restoring());
        let events: Vec<_> = driver.audits().iter().map(|a| a.event().clone()).collect();
        assert_eq!(events, vec![AuditEvent::Restored]);
    }

    #[test]
    fn failed_restore_clears_flag() {
        let auditor = Auditor::new(AuditConfig::default());
        let mut driver = MemoryDriver::new();
        let mut ctx = auditor.context();
        let mut record = article();

        let mut observer = Observer::new(&auditor, &mut driver);
        let result = observer.restore(&mut ctx, &mut record, |_, _, _| {
            Err(AuditorError::Driver(DriverError::MissingSubject {
                subject_type: "articles".into(),
            }))
        });

        assert!(result.is_err());
        assert!(!ctx.is_restoring());
        assert!(observer.updated(&ctx, &record).unwrap().is_some());
    }

    #[test]
    fn modified_decodes_with_record_modifiers() {
        let auditor = Auditor::new(AuditConfig::default());
        let mut driver = MemoryDriver::new();
        let ctx = auditor.context();
        let mut record = article()
            .with_settings(AuditSettings::new().modifier("reviewed", BASE64_ENCODER));
        record.set_attribute("reviewed", Value::from(1));

        auditor
            .execute(&record, AuditEvent::Updated, &ctx, &mut driver)
            .unwrap();
        let audit = driver.latest().unwrap();
        assert_eq!(audit.new_values().get("reviewed"), Some(&Value::from("int:MQ==")));

        let modified = auditor.modified(&record, audit).unwrap();
        let reviewed = modified.get("reviewed").unwrap();
        assert_eq!(reviewed.old, Some(Value::Int(0)));
        assert_eq!(reviewed.new, Some(Value::Int(1)));
    }

    #[test]
    fn transition_uses_configured_aliases() {
        let auditor = Auditor::new(AuditConfig::default())
            .with_aliases(TypeAliases::new().alias("articles", "App\\Models\\Article"));
        let mut record = TrackedRecord::new("App\\Models\\Article")
            .with_attribute("id", 1)
            .with_attribute("title", "B")
            .synced();
        let mut old = crate::core::Attributes::new();
        old.insert("title".into(), Value::from("A"));
        let audit = crate::core::AuditDraft::new("updated", "articles", Some(1.into()))
            .with_values(old, crate::core::Attributes::new())
            .seal();

        auditor.transition(&mut record, &audit, true).unwrap();
        assert_eq!(record.get("title"), Some(&Value::from("A")));
    }
}
