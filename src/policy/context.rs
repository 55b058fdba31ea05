//! Execution context threaded through policy resolution.
//!
//! Replaces process-wide switches: whether auditing is enabled, whether the
//! caller is a batch/console process, and whether a restore is in progress
//! travel with each call instead of living in global state.

use crate::config::AuditConfig;
use crate::core::AuditEvent;
use std::ops::{Deref, DerefMut};

/// Per-call switches that gate auditing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionContext {
    enabled: bool,
    running_in_console: bool,
    audit_console: bool,
    restoring: bool,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            enabled: true,
            running_in_console: false,
            audit_console: false,
            restoring: false,
        }
    }
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            enabled: config.enabled,
            audit_console: config.console,
            ..Self::default()
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Mark the caller as a batch/console process.
    pub fn in_console(mut self, running_in_console: bool) -> Self {
        self.running_in_console = running_in_console;
        self
    }

    /// Allow auditing from console processes.
    pub fn audit_console(mut self, audit_console: bool) -> Self {
        self.audit_console = audit_console;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_running_in_console(&self) -> bool {
        self.running_in_console
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    /// Whether the context lets an event through, before any policy lookup.
    pub fn permits(&self, event: &AuditEvent) -> bool {
        if !self.enabled {
            return false;
        }
        if self.running_in_console && !self.audit_console {
            return false;
        }
        // The write behind a restore also fires `updated`; the restore audit covers it.
        !(self.restoring && *event == AuditEvent::Updated)
    }

    /// Enter a restore. The flag is cleared when the scope drops, on every
    /// exit path including early returns and panics.
    pub fn begin_restore(&mut self) -> RestoreScope<'_> {
        let previous = self.restoring;
        self.restoring = true;
        RestoreScope {
            context: self,
            previous,
        }
    }
}

/// Guard returned by [`ExecutionContext::begin_restore`].
#[derive(Debug)]
pub struct RestoreScope<'a> {
    context: &'a mut ExecutionContext,
    previous: bool,
}

impl Deref for RestoreScope<'_> {
    type Target = ExecutionContext;

    fn deref(&self) -> &ExecutionContext {
        &*self.context
    }
}

impl DerefMut for RestoreScope<'_> {
    fn deref_mut(&mut self) -> &mut ExecutionContext {
        &mut *self.context
    }
}

impl Drop for RestoreScope<'_> {
    fn drop(&mut self) {
        self.context.restoring = self.previous;
    }
}
