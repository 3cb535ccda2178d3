// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Broker Publisher
//!
//! Publishes every event immediately, as a JSON object, over one persistent
//! broker connection.
//!
//! ```text
//! Events → serde_json → bytes → BrokerConnection::publish() → Broker destination
//! ```
//!
//! Delivery is best effort: a failed publish is logged and counted, and the
//! next event is tried as usual. Failing to connect at start aborts pipeline
//! start.
//!
//! # Parameters
//! - `broker.host` (required)
//! - `broker.port` (required)
//! - `broker.destination` (required): topic or queue name

use super::sink_trait::EventSink;
use crate::core::config::FlatConfig;
use crate::core::event::Event;
use crate::core::exception::{ElementError, ElementResult};
use std::fmt::Debug;

/// Capability to open connections to an external broker
pub trait BrokerConnector: Debug + Send {
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        destination: &str,
    ) -> ElementResult<Box<dyn BrokerConnection>>;
}

/// One open broker connection bound to a destination
pub trait BrokerConnection: Debug + Send {
    fn publish(&mut self, payload: &[u8]) -> ElementResult<()>;

    fn disconnect(&mut self) -> ElementResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerPublisherParameters {
    pub host: String,
    pub port: u16,
    pub destination: String,
}

impl BrokerPublisherParameters {
    pub fn new(host: impl Into<String>, port: u16, destination: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            destination: destination.into(),
        }
    }

    pub fn from_flat_config(config: &FlatConfig) -> ElementResult<Self> {
        Ok(Self {
            host: config.get_required("broker.host")?.to_string(),
            port: config.get_required_parsed("broker.port")?,
            destination: config.get_required("broker.destination")?.to_string(),
        })
    }
}

#[derive(Debug)]
pub struct BrokerPublisher<C: BrokerConnector> {
    connector: C,
    connection: Option<Box<dyn BrokerConnection>>,
    published: u64,
    failed_publishes: u64,
}

impl<C: BrokerConnector> BrokerPublisher<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            connection: None,
            published: 0,
            failed_publishes: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn published(&self) -> u64 {
        self.published
    }

    /// Events lost to publish failures
    pub fn failed_publishes(&self) -> u64 {
        self.failed_publishes
    }

    fn disconnect(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            if let Err(e) = connection.disconnect() {
                log::warn!("[BrokerPublisher] Error closing connection: {}", e);
            }
        }
    }
}

impl<C: BrokerConnector> EventSink for BrokerPublisher<C> {
    type Parameters = BrokerPublisherParameters;

    fn on_pipeline_started(&mut self, parameters: Self::Parameters) -> ElementResult<()> {
        self.disconnect();

        log::info!(
            "[BrokerPublisher] Connecting to {}:{}",
            parameters.host,
            parameters.port
        );
        let connection = self
            .connector
            .connect(&parameters.host, parameters.port, &parameters.destination)
            .map_err(|e| {
                ElementError::connection_unavailable_with_source(
                    format!(
                        "Could not connect to broker {} on port {} to destination '{}'",
                        parameters.host, parameters.port, parameters.destination
                    ),
                    Box::new(e),
                )
            })?;

        log::info!(
            "[BrokerPublisher] Connected, publishing to '{}'",
            parameters.destination
        );
        self.connection = Some(connection);
        Ok(())
    }

    fn on_event(&mut self, event: Event) -> ElementResult<()> {
        let connection = self.connection.as_mut().ok_or_else(|| {
            ElementError::lifecycle_violation("BrokerPublisher", "on_event", "disconnected")
        })?;

        let outcome = serde_json::to_vec(&event)
            .map_err(ElementError::from)
            .and_then(|payload| connection.publish(&payload));

        match outcome {
            Ok(()) => self.published += 1,
            Err(e) => {
                self.failed_publishes += 1;
                log::error!("[BrokerPublisher] Publish failed, event dropped: {}", e);
            }
        }
        Ok(())
    }

    fn on_pipeline_stopped(&mut self) -> ElementResult<()> {
        log::info!("[BrokerPublisher] Stopping...");
        self.disconnect();
        Ok(())
    }
}

impl<C: BrokerConnector> Drop for BrokerPublisher<C> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
