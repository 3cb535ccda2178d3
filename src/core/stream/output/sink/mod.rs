// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal elements that deliver events to external systems.
//!
//! | Sink | Delivery |
//! |------|----------|
//! | [`BufferedSink`] | batches to a [`BatchStore`], flushed by count or age |
//! | [`BrokerPublisher`] | one JSON message per event through a [`BrokerConnector`] |

pub mod broker_publisher;
pub mod buffered_sink;
pub mod rabbitmq_broker;
pub mod sink_trait;

pub use broker_publisher::{
    BrokerConnection, BrokerConnector, BrokerPublisher, BrokerPublisherParameters,
};
pub use buffered_sink::{BatchStore, BufferedSink, BufferedSinkParameters};
pub use rabbitmq_broker::{RabbitMqBrokerConfig, RabbitMqConnector};
pub use sink_trait::EventSink;
