//! Scalar attribute values.
//!
//! Audited attributes are flat scalars or null. Native date/time values are
//! normalized to a canonical `YYYY-MM-DD HH:MM:SS` string as soon as they
//! enter a [`Value`], so diffing and modifiers only ever see strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical serialization format for date/time attributes.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Ordered attribute name to value mapping.
pub type Attributes = BTreeMap<String, Value>;

/// A single attribute value.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// String form used by string-oriented modifiers.
    ///
    /// Returns `None` for null, which modifiers pass through untouched.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Self::Int(n) => Some(n.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }

    /// Normalize a timezone-aware timestamp.
    pub fn from_datetime<Tz: TimeZone>(value: &DateTime<Tz>) -> Self {
        Self::Text(value.naive_local().format(DATE_FORMAT).to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::Text(value.format(DATE_FORMAT).to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Text(value.format("%Y-%m-%d").to_string())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(value: DateTime<Tz>) -> Self {
        Self::from_datetime(&value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Tagged mirror used by binary formats, which cannot drive `deserialize_any`.
#[derive(Serialize, Deserialize)]
enum Tagged {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            return match self {
                Self::Null => serializer.serialize_none(),
                Self::Bool(b) => serializer.serialize_bool(*b),
                Self::Int(n) => serializer.serialize_i64(*n),
                Self::Float(x) => serializer.serialize_f64(*x),
                Self::Text(s) => serializer.serialize_str(s),
            };
        }

        let tagged = match self {
            Self::Null => Tagged::Null,
            Self::Bool(b) => Tagged::Bool(*b),
            Self::Int(n) => Tagged::Int(*n),
            Self::Float(x) => Tagged::Float(*x),
            Self::Text(s) => Tagged::Text(s.clone()),
        };
        tagged.serialize(serializer)
    }
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar value or null")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| E::custom(format!("integer {v} out of range")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::Text(v))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            return deserializer.deserialize_any(ScalarVisitor);
        }

        Ok(match Tagged::deserialize(deserializer)? {
            Tagged::Null => Value::Null,
            Tagged::Bool(b) => Value::Bool(b),
            Tagged::Int(n) => Value::Int(n),
            Tagged::Float(x) => Value::Float(x),
            Tagged::Text(s) => Value::Text(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn datetime_normalizes_to_canonical_string() {
        let at = NaiveDate::from_ymd_opt(2012, 6, 14)
            .unwrap()
            .and_hms_opt(15, 3, 0)
            .unwrap();

        assert_eq!(Value::from(at), Value::from("2012-06-14 15:03:00"));
        assert_eq!(
            Value::from(Utc.from_utc_datetime(&at)),
            Value::from("2012-06-14 15:03:00")
        );
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Int(3));
    }

    #[test]
    fn json_representation_is_flat() {
        let mut attributes = Attributes::new();
        attributes.insert("title".into(), Value::from("A"));
        attributes.insert("reviewed".into(), Value::from(1));
        attributes.insert("published_at".into(), Value::Null);

        let json = serde_json::to_string(&attributes).unwrap();
        assert_eq!(json, r#"{"published_at":null,"reviewed":1,"title":"A"}"#);

        let back: Attributes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attributes);
    }

    #[test]
    fn binary_representation_preserves_variants() {
        let values = vec![
            Value::Null,
            Value::Bool(true),
            Value::Int(-4),
            Value::Float(1.5),
            Value::from("text"),
        ];

        let bytes = bincode::serialize(&values).unwrap();
        let back: Vec<Value> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn to_text_stringifies_scalars() {
        assert_eq!(Value::Null.to_text(), None);
        assert_eq!(Value::Bool(false).to_text().as_deref(), Some("0"));
        assert_eq!(Value::Int(0).to_text().as_deref(), Some("0"));
        assert_eq!(Value::from("x").to_text().as_deref(), Some("x"));
    }
}
