//! Audit Trail: attribute-diff audit records for mutable records
//!
//! Every tracked lifecycle event (create, update, delete, restore and custom
//! events) of a record produces an immutable audit record capturing who made
//! the change, what changed and enough context to reconstruct the record's
//! state at that point in time. The core is pure computation over in-memory
//! values; persistence and request state are injected collaborators.
//!
//! # Core Concepts
//!
//! - **Auditable**: the capability surface a tracked record exposes
//! - **Policy**: which events are audited and which attributes take part
//! - **Modifiers**: per-attribute redactors (one-way) and encoders (reversible)
//! - **Builder**: turns a record and an event into a sealed `AuditRecord`
//! - **Transition**: applies one side of a stored diff back onto a live record
//!
//! # Example
//!
//! ```rust
//! use audit_trail::auditor::Auditor;
//! use audit_trail::config::AuditConfig;
//! use audit_trail::core::{AuditEvent, Auditable, TrackedRecord, Value};
//! use audit_trail::driver::MemoryDriver;
//!
//! let auditor = Auditor::new(AuditConfig::default());
//! let ctx = auditor.context();
//! let mut driver = MemoryDriver::new();
//!
//! let mut article = TrackedRecord::new("articles")
//!     .with_attribute("id", 1)
//!     .with_attribute("title", "A")
//!     .synced();
//!
//! article.set_attribute("title", Value::from("B"));
//! auditor.execute(&article, AuditEvent::Updated, &ctx, &mut driver).unwrap();
//! article.sync_original();
//!
//! let audit = driver.latest().unwrap().clone();
//! auditor.transition(&mut article, &audit, true).unwrap();
//! assert_eq!(article.get("title"), Some(&Value::from("A")));
//! ```

pub mod archive;
pub mod auditor;
pub mod builder;
pub mod config;
pub mod core;
pub mod driver;
pub mod modifier;
pub mod policy;
pub mod transition;

// Re-export commonly used types
pub use auditor::{Auditor, AuditorError, Observer};
pub use builder::{AuditBuilder, AuditError, Resolvers};
pub use config::AuditConfig;
pub use crate::core::{AuditEvent, AuditRecord, Auditable, TrackedRecord, Value};
pub use policy::ExecutionContext;
pub use transition::{TransitionEngine, TransitionError, TypeAliases};
