// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text filter: forwards events whose text field equals or contains a keyword.
//!
//! Comparison is exact: case-sensitive, no trimming.
//!
//! # Parameters
//! - `filter.field` (required): selector of the string field to test
//! - `filter.operator` (required): `equals` (alias `matches`) or `contains`
//! - `filter.keyword` (required): keyword to compare against

use super::EventProcessor;
use crate::core::config::FlatConfig;
use crate::core::event::{Event, FieldSelector, PrimitiveType};
use crate::core::exception::{ElementError, ElementResult};
use crate::core::stream::output::collector::EventCollector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringOperator {
    Equals,
    Contains,
}

impl StringOperator {
    /// Parse operator from string (case-insensitive)
    pub fn parse(s: &str) -> ElementResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "equals" | "matches" => Ok(StringOperator::Equals),
            "contains" => Ok(StringOperator::Contains),
            _ => Err(ElementError::invalid_parameter_with_details(
                format!("Invalid string operator '{}'", s),
                "filter.operator",
                "'equals', 'matches' or 'contains'",
            )),
        }
    }

    #[inline]
    pub fn evaluate(&self, value: &str, keyword: &str) -> bool {
        match self {
            StringOperator::Equals => value == keyword,
            StringOperator::Contains => value.contains(keyword),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextFilterParameters {
    pub field: FieldSelector,
    pub operator: StringOperator,
    pub keyword: String,
}

impl TextFilterParameters {
    pub fn new(field: FieldSelector, operator: StringOperator, keyword: impl Into<String>) -> Self {
        Self {
            field,
            operator,
            keyword: keyword.into(),
        }
    }

    pub fn from_flat_config(config: &FlatConfig) -> ElementResult<Self> {
        let field = FieldSelector::parse(config.get_required("filter.field")?, PrimitiveType::String)?;
        let operator = StringOperator::parse(config.get_required("filter.operator")?)?;
        // The keyword is used verbatim, surrounding whitespace included
        let keyword = config.get_required("filter.keyword")?.to_string();

        Ok(Self::new(field, operator, keyword))
    }
}

/// Stateless filter; the only runtime state is the active parameter set.
#[derive(Debug, Default)]
pub struct TextFilter {
    parameters: Option<TextFilterParameters>,
}

impl TextFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventProcessor for TextFilter {
    type Parameters = TextFilterParameters;

    fn on_pipeline_started(&mut self, parameters: Self::Parameters) -> ElementResult<()> {
        self.parameters = Some(parameters);
        Ok(())
    }

    fn on_event(&mut self, event: Event, collector: &mut dyn EventCollector) -> ElementResult<()> {
        let params = self
            .parameters
            .as_ref()
            .ok_or_else(|| ElementError::lifecycle_violation("TextFilter", "on_event", "not started"))?;

        let value = params.field.resolve_string(&event)?;
        if params.operator.evaluate(value, &params.keyword) {
            collector.collect(event);
        }
        Ok(())
    }

    fn on_pipeline_stopped(&mut self) -> ElementResult<()> {
        self.parameters = None;
        Ok(())
    }
}
