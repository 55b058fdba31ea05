//! Stock redactors and encoders.

use super::{AttributeEncoder, AttributeRedactor};
use crate::core::Value;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Mask character used by the stock redactors.
pub const MASK: char = '#';

/// Number of characters a redactor masks for a string of `total` characters.
///
/// A tenth (rounded up) of the string stays readable. Strings no longer than
/// their tenth still get one character masked.
fn masked_len(total: usize) -> usize {
    let tenth = total.div_ceil(10);
    if total > tenth {
        total - tenth
    } else {
        1
    }
}

/// Keeps the trailing tenth of a value readable, masking the rest.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeftRedactor;

impl AttributeRedactor for LeftRedactor {
    fn redact(&self, value: &Value) -> Value {
        let Some(text) = value.to_text() else {
            return Value::Null;
        };
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let keep = total.saturating_sub(masked_len(total));

        let mut out: String = std::iter::repeat(MASK).take(total - keep).collect();
        out.extend(&chars[total - keep..]);
        Value::Text(out)
    }
}

/// Keeps the leading tenth of a value readable, masking the rest.
#[derive(Clone, Copy, Debug, Default)]
pub struct RightRedactor;

impl AttributeRedactor for RightRedactor {
    fn redact(&self, value: &Value) -> Value {
        let Some(text) = value.to_text() else {
            return Value::Null;
        };
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let keep = total.saturating_sub(masked_len(total));

        let mut out: String = chars[..keep].iter().collect();
        out.extend(std::iter::repeat(MASK).take(total - keep));
        Value::Text(out)
    }
}

/// Standard base64 over the value's text form.
///
/// Text is stored as plain base64. Other scalars carry their type as an
/// `int:`, `float:` or `bool:` prefix so they decode to the same variant;
/// the base64 alphabet has no `:`, so plain text never collides with a tag.
/// Null passes through unchanged. Values that do not decode on the way back
/// are returned as stored.
#[derive(Clone, Copy, Debug, Default)]
pub struct Base64Encoder;

impl Base64Encoder {
    fn tag(value: &Value) -> Option<&'static str> {
        match value {
            Value::Bool(_) => Some("bool"),
            Value::Int(_) => Some("int"),
            Value::Float(_) => Some("float"),
            Value::Null | Value::Text(_) => None,
        }
    }

    fn untag(tag: &str, text: String) -> Option<Value> {
        match tag {
            "bool" => match text.as_str() {
                "1" => Some(Value::Bool(true)),
                "0" => Some(Value::Bool(false)),
                _ => None,
            },
            "int" => text.parse().ok().map(Value::Int),
            "float" => text.parse().ok().map(Value::Float),
            _ => None,
        }
    }
}

impl AttributeEncoder for Base64Encoder {
    fn encode(&self, value: &Value) -> Value {
        let Some(text) = value.to_text() else {
            return Value::Null;
        };
        let encoded = STANDARD.encode(text);
        match Self::tag(value) {
            Some(tag) => Value::Text(format!("{tag}:{encoded}")),
            None => Value::Text(encoded),
        }
    }

    fn decode(&self, value: &Value) -> Value {
        let Some(stored) = value.as_str() else {
            return value.clone();
        };
        let (tag, encoded) = match stored.split_once(':') {
            Some((tag, encoded)) => (Some(tag), encoded),
            None => (None, stored),
        };
        let Some(text) = STANDARD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
        else {
            return value.clone();
        };

        match tag {
            None => Value::Text(text),
            Some(tag) => Self::untag(tag, text).unwrap_or_else(|| value.clone()),
        }
    }
}
