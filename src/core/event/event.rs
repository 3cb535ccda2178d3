// SPDX-License-Identifier: MIT OR Apache-2.0

use super::value::FieldValue;
use crate::core::exception::{ElementError, ElementResult};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

/// One unit of data flowing between elements.
///
/// An ordered mapping from field name to [`FieldValue`]. Field names are unique
/// within one nesting level; adding a field under an existing name replaces the
/// value in place and keeps its position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    fields: Vec<(String, FieldValue)>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`Event::add_field`]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.add_field(name, value);
        self
    }

    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Walk a root-relative path through nested events
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&FieldValue> {
        let (last, parents) = path.split_last()?;
        let mut current = self;
        for segment in parents {
            current = current.get(segment.as_ref())?.as_event()?;
        }
        current.get(last.as_ref())
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build an event from a JSON object.
    ///
    /// Integers become `Long`, other numbers `Float`, objects nested events and
    /// arrays lists. `null` members are left out.
    pub fn from_json(value: &JsonValue) -> ElementResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            ElementError::runtime(format!(
                "Event JSON must be an object, found: {}",
                json_kind(value)
            ))
        })?;

        let mut event = Event::new();
        for (name, member) in object {
            if let Some(converted) = json_to_field_value(member)? {
                event.add_field(name.clone(), converted);
            }
        }
        Ok(event)
    }

    pub fn from_json_str(text: &str) -> ElementResult<Self> {
        let value: JsonValue = serde_json::from_str(text)?;
        Self::from_json(&value)
    }

    pub fn to_json(&self) -> ElementResult<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }
}

fn json_to_field_value(value: &JsonValue) -> ElementResult<Option<FieldValue>> {
    let converted = match value {
        JsonValue::Null => return Ok(None),
        JsonValue::Bool(b) => FieldValue::Boolean(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Long(i),
            None => FieldValue::Float(n.as_f64().ok_or_else(|| {
                ElementError::runtime(format!("Number {} is out of range", n))
            })?),
        },
        JsonValue::String(s) => FieldValue::String(s.clone()),
        JsonValue::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                if let Some(v) = json_to_field_value(item)? {
                    values.push(v);
                }
            }
            FieldValue::List(values)
        }
        JsonValue::Object(_) => FieldValue::Nested(Event::from_json(value)?),
    };
    Ok(Some(converted))
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Event::from_json(&value).map_err(D::Error::custom)
    }
}
