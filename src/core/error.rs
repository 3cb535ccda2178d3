// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-event error policy applied by element hosts.
//!
//! Resolution failures (a missing or mistyped field) cost only the offending
//! event. Every other error is handed back to the orchestrator. Nothing here
//! retries; retry and backoff belong to the broker or store behind a sink.

pub mod config;
pub mod handler;

pub use config::{ErrorConfig, LogLevel};
pub use handler::{ErrorAction, EventErrorHandler};
