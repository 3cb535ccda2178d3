// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field selectors address one (possibly nested) field of an [`Event`].
//!
//! Selectors arrive from the platform as `s0::outer::inner`; the leading
//! `s<N>` segment names the input stream and is not part of the event.

use super::event::Event;
use super::value::FieldValue;
use crate::core::exception::{ElementError, ElementResult};
use std::fmt;

const PATH_SEPARATOR: &str = "::";

/// Primitive type a selector requires of the resolved value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    String,
    Integer,
    /// Accepts integers and timestamps as well
    Long,
    /// Accepts any numeric value
    Float,
}

impl PrimitiveType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
        }
    }

    pub fn accepts(&self, value: &FieldValue) -> bool {
        match self {
            PrimitiveType::String => value.as_str().is_some(),
            PrimitiveType::Integer => value.as_integer().is_some(),
            PrimitiveType::Long => value.as_long().is_some(),
            PrimitiveType::Float => value.as_float().is_some(),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable root-relative path plus the primitive type expected at its end
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSelector {
    path: Vec<String>,
    expected: PrimitiveType,
}

impl FieldSelector {
    pub fn new<I, S>(path: I, expected: PrimitiveType) -> ElementResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let path: Vec<String> = path.into_iter().map(Into::into).collect();
        if path.is_empty() || path.iter().any(|segment| segment.trim().is_empty()) {
            return Err(ElementError::invalid_parameter_with_details(
                format!("Invalid field selector path {:?}", path),
                "selector",
                "non-empty path segments",
            ));
        }
        Ok(Self { path, expected })
    }

    /// Parse `s0::a::b` (or plain `a::b`) notation
    pub fn parse(selector: &str, expected: PrimitiveType) -> ElementResult<Self> {
        let mut segments: Vec<&str> = selector.split(PATH_SEPARATOR).map(str::trim).collect();
        if segments.len() > 1 && is_stream_prefix(segments[0]) {
            segments.remove(0);
        }
        Self::new(segments, expected).map_err(|_| {
            ElementError::invalid_parameter_with_details(
                format!("Invalid field selector '{}'", selector),
                "selector",
                "segments separated by '::'",
            )
        })
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn expected_type(&self) -> PrimitiveType {
        self.expected
    }

    /// Resolve the selector against `event`, checking the runtime type
    pub fn resolve<'e>(&self, event: &'e Event) -> ElementResult<&'e FieldValue> {
        let value = event
            .get_path(&self.path)
            .ok_or_else(|| ElementError::field_not_found(self.to_string()))?;

        if !self.expected.accepts(value) {
            return Err(ElementError::type_mismatch(
                self.to_string(),
                self.expected.as_str(),
                value.type_name(),
            ));
        }
        Ok(value)
    }

    pub fn resolve_string<'e>(&self, event: &'e Event) -> ElementResult<&'e str> {
        let value = self.resolve(event)?;
        value
            .as_str()
            .ok_or_else(|| self.mismatch(PrimitiveType::String, value))
    }

    pub fn resolve_long(&self, event: &Event) -> ElementResult<i64> {
        let value = self.resolve(event)?;
        value
            .as_long()
            .ok_or_else(|| self.mismatch(PrimitiveType::Long, value))
    }

    fn mismatch(&self, wanted: PrimitiveType, found: &FieldValue) -> ElementError {
        ElementError::type_mismatch(self.to_string(), wanted.as_str(), found.type_name())
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path.join(PATH_SEPARATOR))
    }
}

fn is_stream_prefix(segment: &str) -> bool {
    segment
        .strip_prefix('s')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}
