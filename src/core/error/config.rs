// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error policy configuration.
//!
//! Parsed from the `error.*` keys of an element's [`FlatConfig`]:
//! - `error.log-level` - level at which dropped events are reported (default: warn)

use crate::core::config::FlatConfig;
use crate::core::exception::{ElementError, ElementResult};

/// Log level for error reporting
///
/// Determines how dropped events are logged when they occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogLevel {
    /// No reporting at all
    Off,
    Debug,
    Info,
    /// Warn level - warning messages (default)
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    pub fn parse(s: &str) -> ElementResult<Self> {
        match s.to_lowercase().as_str() {
            "off" | "none" => Ok(LogLevel::Off),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ElementError::invalid_parameter_with_details(
                format!("Invalid log level '{}'", s),
                "error.log-level",
                "one of 'off', 'debug', 'info', 'warn', 'error'",
            )),
        }
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Map onto the `log` facade; `None` when reporting is switched off
    pub fn to_log_level(self) -> Option<log::Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Debug => Some(log::Level::Debug),
            LogLevel::Info => Some(log::Level::Info),
            LogLevel::Warn => Some(log::Level::Warn),
            LogLevel::Error => Some(log::Level::Error),
        }
    }
}

/// Error handling configuration for one element
#[derive(Debug, Clone, Default)]
pub struct ErrorConfig {
    pub log_level: LogLevel,
}

impl ErrorConfig {
    pub fn new(log_level: LogLevel) -> Self {
        Self { log_level }
    }

    /// Parse error configuration from FlatConfig
    pub fn from_flat_config(config: &FlatConfig) -> ElementResult<Self> {
        let log_level = config
            .get("error.log-level")
            .map(LogLevel::parse)
            .transpose()?
            .unwrap_or_default();

        Ok(Self { log_level })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PropertySource;

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("WARNING").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::parse("off").unwrap(), LogLevel::Off);
        assert!(LogLevel::parse("loud").is_err());
    }

    #[test]
    fn test_error_config_defaults_to_warn() {
        let config = ErrorConfig::from_flat_config(&FlatConfig::new()).unwrap();
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_error_config_from_flat_config() {
        let mut flat = FlatConfig::new();
        flat.set("error.log-level", "debug", PropertySource::Pipeline);
        let config = ErrorConfig::from_flat_config(&flat).unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_level.to_log_level(), Some(log::Level::Debug));
    }
}
