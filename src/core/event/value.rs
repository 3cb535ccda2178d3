// SPDX-License-Identifier: MIT OR Apache-2.0

use super::event::Event;
use serde::Serialize;

/// Value held by one event field.
///
/// Serializes without a type tag, so an event maps onto a plain JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i32),
    Long(i64),
    Float(f64),
    Boolean(bool),
    /// Milliseconds since the Unix epoch
    Timestamp(i64),
    Nested(Event),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::String(_) => "string",
            FieldValue::Integer(_) => "integer",
            FieldValue::Long(_) => "long",
            FieldValue::Float(_) => "float",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Nested(_) => "nested event",
            FieldValue::List(_) => "list",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Longs narrow to `i32` when they fit, since JSON numbers arrive as longs
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Long(l) => i32::try_from(*l).ok(),
            _ => None,
        }
    }

    /// Integers and timestamps widen to `i64`
    pub fn as_long(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(i64::from(*i)),
            FieldValue::Long(l) | FieldValue::Timestamp(l) => Some(*l),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(f64::from(*i)),
            FieldValue::Long(l) => Some(*l as f64),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            FieldValue::Nested(e) => Some(e),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Long(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<Event> for FieldValue {
    fn from(value: Event) -> Self {
        FieldValue::Nested(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::List(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_widening() {
        assert_eq!(FieldValue::Integer(7).as_long(), Some(7));
        assert_eq!(FieldValue::Timestamp(1_700_000_000_000).as_long(), Some(1_700_000_000_000));
        assert_eq!(FieldValue::from("7").as_long(), None);
    }

    #[test]
    fn test_untagged_serialization() {
        let json = serde_json::to_string(&FieldValue::List(vec![
            FieldValue::from(1i64),
            FieldValue::from("a"),
            FieldValue::Timestamp(5),
        ]))
        .unwrap();
        assert_eq!(json, r#"[1,"a",5]"#);
    }
}
