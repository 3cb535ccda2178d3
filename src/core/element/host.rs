// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hosts bind an element to its parameters and drive its lifecycle.
//!
//! The parameters are handed over at construction and never mutated; every
//! `start` receives its own clone. Runtime state lives inside the element and
//! is rebuilt by `on_pipeline_started`.

use super::{Element, ElementStats, Lifecycle, LifecycleState};
use crate::core::error::{ErrorAction, ErrorConfig, EventErrorHandler};
use crate::core::event::Event;
use crate::core::exception::ElementResult;
use crate::core::processor::EventProcessor;
use crate::core::stream::output::collector::EventCollector;
use crate::core::stream::output::sink::EventSink;

/// Runs an [`EventProcessor`] and routes its output into a collector.
#[derive(Debug)]
pub struct ProcessorHost<P: EventProcessor> {
    processor: P,
    parameters: P::Parameters,
    collector: Box<dyn EventCollector>,
    lifecycle: Lifecycle,
    error_handler: EventErrorHandler,
    events_received: u64,
}

impl<P: EventProcessor> ProcessorHost<P> {
    pub fn new(
        name: impl Into<String>,
        processor: P,
        parameters: P::Parameters,
        collector: Box<dyn EventCollector>,
    ) -> Self {
        let name = name.into();
        Self {
            processor,
            parameters,
            collector,
            error_handler: EventErrorHandler::new(ErrorConfig::default(), name.clone()),
            lifecycle: Lifecycle::new(name),
            events_received: 0,
        }
    }

    pub fn with_error_config(mut self, config: ErrorConfig) -> Self {
        self.error_handler = EventErrorHandler::new(config, self.lifecycle.element());
        self
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn parameters(&self) -> &P::Parameters {
        &self.parameters
    }
}

impl<P: EventProcessor> Element for ProcessorHost<P> {
    fn name(&self) -> &str {
        self.lifecycle.element()
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    fn start(&mut self) -> ElementResult<()> {
        self.lifecycle.ensure(&[LifecycleState::Created], "start")?;

        match self.processor.on_pipeline_started(self.parameters.clone()) {
            Ok(()) => {
                log::info!("[{}] Started", self.lifecycle.element());
                self.lifecycle.transition(LifecycleState::Started);
                Ok(())
            }
            Err(e) => {
                log::error!("[{}] Start failed: {}", self.lifecycle.element(), e);
                self.lifecycle.transition(LifecycleState::StartFailed);
                Err(e)
            }
        }
    }

    fn on_event(&mut self, event: Event) -> ElementResult<()> {
        self.lifecycle.ensure(&[LifecycleState::Started], "on_event")?;
        self.events_received += 1;

        match self.processor.on_event(event, self.collector.as_mut()) {
            Ok(()) => Ok(()),
            Err(e) => match self.error_handler.handle_error(&e) {
                ErrorAction::Drop => Ok(()),
                ErrorAction::Propagate => Err(e),
            },
        }
    }

    fn stop(&mut self) -> ElementResult<()> {
        self.lifecycle.ensure(
            &[LifecycleState::Started, LifecycleState::StartFailed],
            "stop",
        )?;

        let result = self.processor.on_pipeline_stopped();
        self.lifecycle.transition(LifecycleState::Stopped);
        log::info!("[{}] Stopped", self.lifecycle.element());
        result
    }

    fn stats(&self) -> ElementStats {
        ElementStats {
            events_received: self.events_received,
            events_dropped: self.error_handler.dropped_events(),
        }
    }
}

/// Runs a terminal [`EventSink`].
#[derive(Debug)]
pub struct SinkHost<S: EventSink> {
    sink: S,
    parameters: S::Parameters,
    lifecycle: Lifecycle,
    error_handler: EventErrorHandler,
    events_received: u64,
}

impl<S: EventSink> SinkHost<S> {
    pub fn new(name: impl Into<String>, sink: S, parameters: S::Parameters) -> Self {
        let name = name.into();
        Self {
            sink,
            parameters,
            error_handler: EventErrorHandler::new(ErrorConfig::default(), name.clone()),
            lifecycle: Lifecycle::new(name),
            events_received: 0,
        }
    }

    pub fn with_error_config(mut self, config: ErrorConfig) -> Self {
        self.error_handler = EventErrorHandler::new(config, self.lifecycle.element());
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn parameters(&self) -> &S::Parameters {
        &self.parameters
    }
}

impl<S: EventSink> Element for SinkHost<S> {
    fn name(&self) -> &str {
        self.lifecycle.element()
    }

    fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    fn start(&mut self) -> ElementResult<()> {
        self.lifecycle.ensure(&[LifecycleState::Created], "start")?;

        match self.sink.on_pipeline_started(self.parameters.clone()) {
            Ok(()) => {
                log::info!("[{}] Started", self.lifecycle.element());
                self.lifecycle.transition(LifecycleState::Started);
                Ok(())
            }
            Err(e) => {
                log::error!("[{}] Start failed: {}", self.lifecycle.element(), e);
                self.lifecycle.transition(LifecycleState::StartFailed);
                Err(e)
            }
        }
    }

    fn on_event(&mut self, event: Event) -> ElementResult<()> {
        self.lifecycle.ensure(&[LifecycleState::Started], "on_event")?;
        self.events_received += 1;

        match self.sink.on_event(event) {
            Ok(()) => Ok(()),
            Err(e) => match self.error_handler.handle_error(&e) {
                ErrorAction::Drop => Ok(()),
                ErrorAction::Propagate => Err(e),
            },
        }
    }

    fn stop(&mut self) -> ElementResult<()> {
        self.lifecycle.ensure(
            &[LifecycleState::Started, LifecycleState::StartFailed],
            "stop",
        )?;

        let result = self.sink.on_pipeline_stopped();
        self.lifecycle.transition(LifecycleState::Stopped);
        log::info!("[{}] Stopped", self.lifecycle.element());
        result
    }

    fn stats(&self) -> ElementStats {
        ElementStats {
            events_received: self.events_received,
            events_dropped: self.error_handler.dropped_events(),
        }
    }
}
