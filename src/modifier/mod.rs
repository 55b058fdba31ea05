//! Attribute modifier pipeline.
//!
//! Records may register a modifier identifier per attribute. Identifiers are
//! resolved against a [`ModifierRegistry`], where every entry is either a
//! one-way [`AttributeRedactor`] or a reversible [`AttributeEncoder`]. The
//! capability is fixed when the modifier is registered, so dispatch never
//! has to probe what a modifier can do.
//!
//! # Example
//!
//! ```rust
//! use audit_trail::core::Value;
//! use audit_trail::modifier::{Direction, ModifierPipeline, ModifierRegistry};
//! use std::collections::BTreeMap;
//!
//! let registry = ModifierRegistry::default();
//! let mut registrations = BTreeMap::new();
//! registrations.insert("reviewed".to_string(), "base64".to_string());
//!
//! let pipeline = ModifierPipeline::new(&registry, &registrations);
//! let stored = pipeline
//!     .apply(Direction::Encode, "reviewed", Value::from(1))
//!     .unwrap();
//! assert_eq!(stored, Value::from("int:MQ=="));
//! ```

mod builtin;
pub mod error;

pub use builtin::{Base64Encoder, LeftRedactor, RightRedactor, MASK};
pub use error::ModifierError;

use crate::core::{Attributes, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Registry identifier of [`LeftRedactor`].
pub const LEFT_REDACTOR: &str = "left_redactor";
/// Registry identifier of [`RightRedactor`].
pub const RIGHT_REDACTOR: &str = "right_redactor";
/// Registry identifier of [`Base64Encoder`].
pub const BASE64_ENCODER: &str = "base64";

/// One-way transform. Redacted values can never be turned back.
pub trait AttributeRedactor: Send + Sync {
    fn redact(&self, value: &Value) -> Value;
}

/// Reversible transform: `decode(encode(x)) == x`.
pub trait AttributeEncoder: Send + Sync {
    fn encode(&self, value: &Value) -> Value;
    fn decode(&self, value: &Value) -> Value;
}

/// Which way values flow through the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Building a new audit record.
    Encode,
    /// Presenting or transitioning from a stored record.
    Decode,
}

/// A registered modifier, tagged by capability.
#[derive(Clone)]
pub enum Modifier {
    Redactor(Arc<dyn AttributeRedactor>),
    Encoder(Arc<dyn AttributeEncoder>),
}

impl Modifier {
    pub fn redactor<R: AttributeRedactor + 'static>(redactor: R) -> Self {
        Self::Redactor(Arc::new(redactor))
    }

    pub fn encoder<E: AttributeEncoder + 'static>(encoder: E) -> Self {
        Self::Encoder(Arc::new(encoder))
    }

    pub fn is_reversible(&self) -> bool {
        matches!(self, Self::Encoder(_))
    }

    /// Run the modifier in the given direction.
    ///
    /// Decoding a redacted value yields the stored value as-is; callers that
    /// need the original back must reject redactors first.
    pub fn apply(&self, direction: Direction, value: &Value) -> Value {
        match (self, direction) {
            (Self::Redactor(r), Direction::Encode) => r.redact(value),
            (Self::Redactor(_), Direction::Decode) => value.clone(),
            (Self::Encoder(e), Direction::Encode) => e.encode(value),
            (Self::Encoder(e), Direction::Decode) => e.decode(value),
        }
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redactor(_) => f.write_str("Modifier::Redactor"),
            Self::Encoder(_) => f.write_str("Modifier::Encoder"),
        }
    }
}

/// Identifier to modifier lookup table.
///
/// `ModifierRegistry::default()` carries the stock modifiers;
/// `ModifierRegistry::empty()` carries none.
#[derive(Clone, Debug)]
pub struct ModifierRegistry {
    modifiers: HashMap<String, Modifier>,
}

impl Default for ModifierRegistry {
    fn default() -> Self {
        Self::empty()
            .register(LEFT_REDACTOR, Modifier::redactor(LeftRedactor))
            .register(RIGHT_REDACTOR, Modifier::redactor(RightRedactor))
            .register(BASE64_ENCODER, Modifier::encoder(Base64Encoder))
    }
}

impl ModifierRegistry {
    pub fn empty() -> Self {
        Self {
            modifiers: HashMap::new(),
        }
    }

    /// Register a modifier under an identifier, replacing any previous entry.
    pub fn register(mut self, identifier: impl Into<String>, modifier: Modifier) -> Self {
        self.modifiers.insert(identifier.into(), modifier);
        self
    }

    pub fn get(&self, identifier: &str) -> Option<&Modifier> {
        self.modifiers.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.modifiers.contains_key(identifier)
    }
}

/// A record's modifier registrations bound to a registry.
#[derive(Clone, Copy, Debug)]
pub struct ModifierPipeline<'a> {
    registry: &'a ModifierRegistry,
    registrations: &'a BTreeMap<String, String>,
}

impl<'a> ModifierPipeline<'a> {
    pub fn new(
        registry: &'a ModifierRegistry,
        registrations: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            registry,
            registrations,
        }
    }

    /// Modifier configured for an attribute, if any.
    pub fn resolve(&self, attribute: &str) -> Result<Option<&'a Modifier>, ModifierError> {
        let Some(identifier) = self.registrations.get(attribute) else {
            return Ok(None);
        };

        self.registry
            .get(identifier)
            .map(Some)
            .ok_or_else(|| ModifierError::InvalidModifier {
                attribute: attribute.to_string(),
                identifier: identifier.clone(),
            })
    }

    /// Pass a single value through the attribute's modifier.
    pub fn apply(
        &self,
        direction: Direction,
        attribute: &str,
        value: Value,
    ) -> Result<Value, ModifierError> {
        Ok(match self.resolve(attribute)? {
            Some(modifier) => modifier.apply(direction, &value),
            None => value,
        })
    }

    /// Pass every value of a map through the pipeline.
    pub fn apply_all(
        &self,
        direction: Direction,
        attributes: Attributes,
    ) -> Result<Attributes, ModifierError> {
        attributes
            .into_iter()
            .map(|(key, value)| {
                let value = self.apply(direction, &key, value)?;
                Ok((key, value))
            })
            .collect()
    }

    /// First attribute (in name order) configured with a redactor.
    pub fn first_redacted(&self) -> Result<Option<&'a str>, ModifierError> {
        for attribute in self.registrations.keys() {
            if let Some(Modifier::Redactor(_)) = self.resolve(attribute)? {
                return Ok(Some(attribute.as_str()));
            }
        }
        Ok(None)
    }
}
