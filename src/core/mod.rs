//! Core audit types.
//!
//! This module contains the data model shared by every other module:
//! - Scalar attribute values and identities
//! - The `Auditable` capability surface for tracked records
//! - Lifecycle event names
//! - Immutable audit records
//!
//! Nothing in this module performs I/O.

mod audit;
mod event;
mod record;
mod subject;
mod value;

pub use audit::{Actor, AuditContext, AuditDraft, AuditRecord, Modified};
pub use event::AuditEvent;
pub use record::{
    AttributeStrategy, AuditSettings, Auditable, Diff, TrackedRecord, DEFAULT_TIMESTAMPS,
};
pub use subject::SubjectId;
pub use value::{Attributes, Value, DATE_FORMAT};
