// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Element Lifecycle
//!
//! Every processor and sink moves through the same states:
//!
//! ```text
//! Created ──start()──▶ Started ──stop()──▶ Stopped
//!    │                                       ▲
//!    └──start() fails──▶ StartFailed ──stop()┘
//! ```
//!
//! `on_event` is only valid while `Started`. Any call out of order returns
//! [`ElementError::LifecycleViolation`], a caller bug that is never recovered.

pub mod host;

pub use host::{ProcessorHost, SinkHost};

use crate::core::event::Event;
use crate::core::exception::{ElementError, ElementResult};
use std::fmt::{self, Debug};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Created,
    Started,
    /// `start` returned an error; only `stop` is allowed
    StartFailed,
    /// Terminal
    Stopped,
}

impl LifecycleState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::Started => "started",
            LifecycleState::StartFailed => "start-failed",
            LifecycleState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object-safe surface the orchestrator drives.
pub trait Element: Debug + Send {
    fn name(&self) -> &str;

    fn state(&self) -> LifecycleState;

    /// Initialize runtime state and external connections
    fn start(&mut self) -> ElementResult<()>;

    /// Process one event
    fn on_event(&mut self, event: Event) -> ElementResult<()>;

    /// Release runtime state and external connections
    fn stop(&mut self) -> ElementResult<()>;

    fn stats(&self) -> ElementStats;
}

/// Per-element counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementStats {
    /// Events accepted by `on_event`
    pub events_received: u64,
    /// Events discarded because a field could not be resolved
    pub events_dropped: u64,
}

/// Tracks one element's lifecycle state and rejects out-of-order calls.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    element: String,
    state: LifecycleState,
}

impl Lifecycle {
    pub(crate) fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            state: LifecycleState::Created,
        }
    }

    pub(crate) fn element(&self) -> &str {
        &self.element
    }

    pub(crate) fn state(&self) -> LifecycleState {
        self.state
    }

    pub(crate) fn ensure(&self, allowed: &[LifecycleState], operation: &str) -> ElementResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ElementError::lifecycle_violation(
                &self.element,
                operation,
                self.state,
            ))
        }
    }

    pub(crate) fn transition(&mut self, next: LifecycleState) {
        log::debug!("[{}] {} -> {}", self.element, self.state, next);
        self.state = next;
    }
}
