// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Event Error Handler
//!
//! Decides, per failed `on_event` call, whether the element keeps running.
//!
//! ```rust,ignore
//! match handler.handle_error(&error) {
//!     ErrorAction::Drop => Ok(()),   // event discarded, element continues
//!     ErrorAction::Propagate => Err(error),
//! }
//! ```

use super::config::ErrorConfig;
use crate::core::exception::{ElementError, ErrorCategory};

/// Action to take after error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Drop the event and continue processing
    Drop,
    /// Hand the error to the caller
    Propagate,
}

/// Applies the per-event error policy and keeps drop statistics.
#[derive(Debug)]
pub struct EventErrorHandler {
    config: ErrorConfig,
    element_name: String,
    dropped_events: u64,
}

impl EventErrorHandler {
    pub fn new(config: ErrorConfig, element_name: impl Into<String>) -> Self {
        Self {
            config,
            element_name: element_name.into(),
            dropped_events: 0,
        }
    }

    pub fn handle_error(&mut self, error: &ElementError) -> ErrorAction {
        match error.category() {
            ErrorCategory::Resolution => {
                self.dropped_events += 1;
                if let Some(level) = self.config.log_level.to_log_level() {
                    log::log!(
                        level,
                        "[{}] Dropping event: {} (dropped so far: {})",
                        self.element_name,
                        error,
                        self.dropped_events
                    );
                }
                ErrorAction::Drop
            }
            _ => {
                log::error!("[{}] {}", self.element_name, error);
                ErrorAction::Propagate
            }
        }
    }

    /// Number of events discarded because of resolution errors
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }
}
