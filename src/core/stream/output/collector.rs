// SPDX-License-Identifier: MIT OR Apache-2.0

//! Downstream collectors.
//!
//! A processor pushes every event it emits into the collector it was started
//! with. Calls are synchronous and arrive downstream in emission order.

use crate::core::event::Event;
use crossbeam_channel::Sender;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

pub trait EventCollector: Debug + Send {
    /// Accept one event
    fn collect(&mut self, event: Event);
}

/// Keeps every collected event in a shared vector.
///
/// Clones share the same storage, so a test or an embedding orchestrator can
/// keep a handle while the element owns the collector.
#[derive(Debug, Clone, Default)]
pub struct CollectingCollector {
    pub events: Arc<Mutex<Vec<Event>>>,
}

impl CollectingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything collected so far
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Remove and return everything collected so far
    pub fn drain(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventCollector for CollectingCollector {
    fn collect(&mut self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

/// Hands events to the next pipeline stage over a crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelCollector {
    sender: Sender<Event>,
}

impl ChannelCollector {
    pub fn new(sender: Sender<Event>) -> Self {
        Self { sender }
    }
}

impl EventCollector for ChannelCollector {
    fn collect(&mut self, event: Event) {
        if let Err(e) = self.sender.send(event) {
            log::warn!(
                "[ChannelCollector] Downstream receiver is gone, discarding event: {:?}",
                e.into_inner()
            );
        }
    }
}

/// Debug collector that logs each event
#[derive(Debug, Clone)]
pub struct LogCollector {
    prefix: String,
}

impl LogCollector {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LogCollector {
    fn default() -> Self {
        Self::new("[LOG]")
    }
}

impl EventCollector for LogCollector {
    fn collect(&mut self, event: Event) {
        match serde_json::to_string(&event) {
            Ok(json) => log::info!("{} {}", self.prefix, json),
            Err(_) => log::info!("{} {:?}", self.prefix, event),
        }
    }
}
