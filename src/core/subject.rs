//! Identity of an audited subject.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Primary key of a tracked record.
///
/// Keys may be integers or strings. Two keys are the same subject when they
/// denote the same value, so `Int(1)` matches `Str("1")`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SubjectId {
    Int(i64),
    Str(String),
}

impl SubjectId {
    /// Compare two keys after normalizing them to the same representation.
    pub fn matches(&self, other: &SubjectId) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(n), Self::Str(s)) | (Self::Str(s), Self::Int(n)) => {
                s.trim().parse::<i64>().is_ok_and(|parsed| parsed == *n)
            }
        }
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for SubjectId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for SubjectId {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for SubjectId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for SubjectId {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

#[derive(Serialize, Deserialize)]
enum Tagged {
    Int(i64),
    Str(String),
}

impl Serialize for SubjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (self, serializer.is_human_readable()) {
            (Self::Int(n), true) => serializer.serialize_i64(*n),
            (Self::Str(s), true) => serializer.serialize_str(s),
            (Self::Int(n), false) => Tagged::Int(*n).serialize(serializer),
            (Self::Str(s), false) => Tagged::Str(s.clone()).serialize(serializer),
        }
    }
}

struct KeyVisitor;

impl<'de> Visitor<'de> for KeyVisitor {
    type Value = SubjectId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or string key")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<SubjectId, E> {
        Ok(SubjectId::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<SubjectId, E> {
        i64::try_from(v)
            .map(SubjectId::Int)
            .map_err(|_| E::custom(format!("key {v} out of range")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<SubjectId, E> {
        Ok(SubjectId::Str(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<SubjectId, E> {
        Ok(SubjectId::Str(v))
    }
}

impl<'de> Deserialize<'de> for SubjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            return deserializer.deserialize_any(KeyVisitor);
        }

        Ok(match Tagged::deserialize(deserializer)? {
            Tagged::Int(n) => SubjectId::Int(n),
            Tagged::Str(s) => SubjectId::Str(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_and_numeric_string_match() {
        assert!(SubjectId::from(1).matches(&SubjectId::from("1")));
        assert!(SubjectId::from("42").matches(&SubjectId::from(42)));
    }

    #[test]
    fn different_values_do_not_match() {
        assert!(!SubjectId::from(1).matches(&SubjectId::from(2)));
        assert!(!SubjectId::from(1).matches(&SubjectId::from("one")));
        assert!(!SubjectId::from("a").matches(&SubjectId::from("b")));
    }

    #[test]
    fn serializes_as_plain_key() {
        assert_eq!(serde_json::to_string(&SubjectId::from(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&SubjectId::from("uuid-1")).unwrap(),
            r#""uuid-1""#
        );
    }
}
