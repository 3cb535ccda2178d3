// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::core::event::Event;
use crate::core::exception::ElementResult;
use std::fmt::Debug;

/// Contract every sink implements.
pub trait EventSink: Debug + Send {
    /// Immutable configuration produced before the sink starts
    type Parameters: Debug + Clone + Send;

    /// Establish external connections and runtime state.
    ///
    /// **Fail-Fast Principle**: if a required external resource is not
    /// reachable, return an error; the pipeline must not start with a
    /// disconnected sink.
    fn on_pipeline_started(&mut self, parameters: Self::Parameters) -> ElementResult<()>;

    /// Deliver one event
    fn on_event(&mut self, event: Event) -> ElementResult<()>;

    /// Release connections and runtime state; must tolerate a partially failed start
    fn on_pipeline_stopped(&mut self) -> ElementResult<()>;
}
