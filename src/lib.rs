// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pluggable stream-processing elements for the EventFlux pipeline platform.
//!
//! Elements are driven by an external orchestrator through a fixed lifecycle
//! (`start` → `on_event`* → `stop`). Processors emit derived events to an
//! [`EventCollector`](core::stream::output::collector::EventCollector); sinks
//! deliver events to external stores and brokers.

pub mod core;
