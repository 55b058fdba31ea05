//! Audited-attribute filtering and the default event strategies.

use crate::config::AuditConfig;
use crate::core::{Attributes, AuditSettings, Auditable, Diff, Value};
use std::collections::BTreeSet;

/// Decides which attributes of a record take part in its audits.
///
/// The audited subset is the include list (or every attribute when it is
/// empty) minus the exclude list, minus hidden attributes in strict mode,
/// minus timestamps unless timestamp auditing is on, minus the primary key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeFilter {
    include: BTreeSet<String>,
    excluded: BTreeSet<String>,
}

impl AttributeFilter {
    pub fn for_record<R: Auditable>(
        record: &R,
        settings: &AuditSettings,
        config: &AuditConfig,
    ) -> Self {
        let mut excluded: BTreeSet<String> = settings.exclude.iter().cloned().collect();

        if settings.strict.unwrap_or(config.strict) {
            excluded.extend(record.hidden().iter().cloned());

            let visible = record.visible();
            if !visible.is_empty() {
                excluded.extend(
                    record
                        .attributes()
                        .keys()
                        .filter(|key| !visible.contains(*key))
                        .cloned(),
                );
            }
        }

        if !settings.timestamps.unwrap_or(config.timestamps) {
            excluded.extend(record.timestamp_attributes().iter().map(|s| s.to_string()));
        }

        excluded.insert(record.key_name().to_string());

        Self {
            include: settings.include.iter().cloned().collect(),
            excluded,
        }
    }

    pub fn is_audited(&self, attribute: &str) -> bool {
        if self.excluded.contains(attribute) {
            return false;
        }
        self.include.is_empty() || self.include.contains(attribute)
    }

    /// Copy of the audited subset of `attributes`.
    pub fn audited(&self, attributes: &Attributes) -> Attributes {
        attributes
            .iter()
            .filter(|(key, _)| self.is_audited(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Built-in strategy: receives the record and its audited-attribute filter.
pub(crate) type BuiltinStrategy<R> = fn(&R, &AttributeFilter) -> Diff;

/// Look up a built-in strategy by its conventional name.
pub(crate) fn builtin<R: Auditable>(name: &str) -> Option<BuiltinStrategy<R>> {
    let strategy: BuiltinStrategy<R> = match name {
        "getCreatedEventAttributes" => created::<R>,
        "getUpdatedEventAttributes" => updated::<R>,
        "getDeletedEventAttributes" => deleted::<R>,
        "getRestoredEventAttributes" => restored::<R>,
        "getRetrievedEventAttributes" => retrieved::<R>,
        _ => return None,
    };
    Some(strategy)
}

fn created<R: Auditable>(record: &R, filter: &AttributeFilter) -> Diff {
    Diff::new(Attributes::new(), filter.audited(record.attributes()))
}

fn updated<R: Auditable>(record: &R, filter: &AttributeFilter) -> Diff {
    let original = record.original();
    let mut diff = Diff::default();

    for (key, value) in record.dirty() {
        if !filter.is_audited(&key) {
            continue;
        }
        let before = original.get(&key).cloned().unwrap_or(Value::Null);
        diff.old.insert(key.clone(), before);
        diff.new.insert(key, value);
    }

    diff
}

fn deleted<R: Auditable>(record: &R, filter: &AttributeFilter) -> Diff {
    Diff::new(filter.audited(record.attributes()), Attributes::new())
}

fn restored<R: Auditable>(record: &R, filter: &AttributeFilter) -> Diff {
    let Diff { old, new } = deleted(record, filter);
    Diff::new(new, old)
}

fn retrieved<R: Auditable>(_record: &R, _filter: &AttributeFilter) -> Diff {
    Diff::default()
}
