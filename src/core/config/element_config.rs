// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Element Configuration Module
//!
//! Elements receive their parameters as flat `key = value` properties that the
//! orchestrator has already declared and validated. Properties may come from
//! several layers, merged by priority.
//!
//! ## Configuration Sources (Priority: Low to High)
//!
//! 1. **Default** - Built-in Rust defaults
//! 2. **TomlFile** - `[elements.<name>]` table of a TOML file
//! 3. **Pipeline** - Parameters handed over by the orchestrator (highest priority)
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let mut config = FlatConfig::from_toml_str(text, "duration")?;
//! config.set("task.output-unit", "seconds", PropertySource::Pipeline);
//!
//! let params = TaskDurationParameters::from_flat_config(&config)?;
//! ```

use crate::core::exception::{ElementError, ElementResult};
use std::collections::HashMap;
use std::str::FromStr;

/// Property source identifier with priority ordering
///
/// Higher priority sources override lower priority sources during configuration merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertySource {
    /// Rust code defaults (priority: 0)
    Default,
    /// TOML `[elements.<name>]` table (priority: 1)
    TomlFile,
    /// Orchestrator-supplied parameters (priority: 2)
    Pipeline,
}

impl PropertySource {
    #[inline]
    pub const fn priority(&self) -> u8 {
        match self {
            PropertySource::Default => 0,
            PropertySource::TomlFile => 1,
            PropertySource::Pipeline => 2,
        }
    }
}

/// Flat key-value configuration with source tracking
///
/// Uses priority-based merging: higher priority sources override lower priority sources.
#[derive(Debug, Clone, Default)]
pub struct FlatConfig {
    properties: HashMap<String, String>,
    sources: HashMap<String, PropertySource>,
}

impl FlatConfig {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from orchestrator-supplied properties
    pub fn from_properties(properties: &HashMap<String, String>) -> Self {
        let mut config = Self::new();
        for (key, value) in properties {
            config.set(key.clone(), value.clone(), PropertySource::Pipeline);
        }
        config
    }

    /// Read the `[elements.<element_name>]` table of a TOML document.
    ///
    /// Nested tables are flattened with `.` so that
    /// `[elements.sink.buffer] batch-size = 10` yields `buffer.batch-size = "10"`.
    pub fn from_toml_str(text: &str, element_name: &str) -> ElementResult<Self> {
        let document = text.parse::<toml::Table>().map_err(|e| {
            ElementError::configuration(format!("Invalid TOML configuration: {}", e))
        })?;

        let table = document
            .get("elements")
            .and_then(toml::Value::as_table)
            .and_then(|elements| elements.get(element_name))
            .and_then(toml::Value::as_table)
            .ok_or_else(|| {
                ElementError::configuration_with_key(
                    format!("No configuration table for element '{}'", element_name),
                    format!("elements.{}", element_name),
                )
            })?;

        let mut config = Self::new();
        flatten_toml(table, "", &mut config);
        Ok(config)
    }

    /// Set a property with source tracking and priority-based override
    ///
    /// Only sets the value if the new source has equal or higher priority than the existing source.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>, source: PropertySource) {
        let key = key.into();

        if let Some(existing_source) = self.sources.get(&key) {
            if existing_source.priority() > source.priority() {
                return;
            }
        }

        self.properties.insert(key.clone(), value.into());
        self.sources.insert(key, source);
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Get a property value with its source
    #[inline]
    pub fn get_with_source(&self, key: &str) -> Option<(&str, PropertySource)> {
        self.properties
            .get(key)
            .and_then(|value| self.sources.get(key).map(|source| (value.as_str(), *source)))
    }

    /// Get a property that must be present
    pub fn get_required(&self, key: &str) -> ElementResult<&str> {
        self.get(key)
            .ok_or_else(|| ElementError::missing_parameter(key))
    }

    /// Parse an optional property into `T`
    pub fn get_parsed<T>(&self, key: &str) -> ElementResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| {
                    ElementError::invalid_parameter_with_details(
                        format!("Cannot parse '{}': {}", raw, e),
                        key,
                        std::any::type_name::<T>(),
                    )
                })
            })
            .transpose()
    }

    /// Parse a property that must be present
    pub fn get_required_parsed<T>(&self, key: &str) -> ElementResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_parsed(key)?
            .ok_or_else(|| ElementError::missing_parameter(key))
    }

    /// Merge another configuration into this one (respects priorities)
    pub fn merge(&mut self, other: &FlatConfig) {
        for (key, value) in &other.properties {
            if let Some(source) = other.sources.get(key) {
                self.set(key.clone(), value.clone(), *source);
            }
        }
    }
}

fn flatten_toml(table: &toml::Table, prefix: &str, config: &mut FlatConfig) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            toml::Value::Table(nested) => flatten_toml(nested, &full_key, config),
            toml::Value::String(s) => config.set(full_key, s.clone(), PropertySource::TomlFile),
            toml::Value::Array(items) => {
                let joined = items
                    .iter()
                    .map(|item| match item {
                        toml::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                config.set(full_key, joined, PropertySource::TomlFile);
            }
            other => config.set(full_key, other.to_string(), PropertySource::TomlFile),
        }
    }
}
