// SPDX-License-Identifier: MIT OR Apache-2.0

//! # RabbitMQ Broker
//!
//! [`BrokerConnector`] over AMQP 0-9-1. The publisher destination becomes the
//! routing key on the configured exchange, so a topic name maps onto the
//! default `amq.topic` exchange.
//!
//! ```text
//! BrokerPublisher → RabbitMqConnection::publish() → exchange --routing key--> queues
//! ```
//!
//! # Properties
//! - `rabbitmq.vhost`: Virtual host (default: "/")
//! - `rabbitmq.username`: Username (default: "guest")
//! - `rabbitmq.password`: Password (default: "guest")
//! - `rabbitmq.exchange`: Exchange to publish to (default: "amq.topic")
//! - `rabbitmq.exchange.type`: Exchange type when declaring (default: "topic")
//! - `rabbitmq.declare.exchange`: Declare exchange if missing (default: false)
//! - `rabbitmq.persistent`: Message persistence (default: true)
//! - `rabbitmq.content.type`: Content-Type header (default: "application/json")
//! - `rabbitmq.mandatory`: Return unroutable messages (default: false)

use super::broker_publisher::{BrokerConnection, BrokerConnector};
use crate::core::config::FlatConfig;
use crate::core::exception::{ElementError, ElementResult};
use lapin::publisher_confirm::Confirmation;
use std::future::Future;

const DEFAULT_EXCHANGE: &str = "amq.topic";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RabbitMqBrokerConfig {
    pub vhost: String,
    pub username: String,
    pub password: String,
    pub exchange: String,
    pub exchange_type: String,
    pub declare_exchange: bool,
    pub persistent: bool,
    pub content_type: Option<String>,
    pub mandatory: bool,
}

impl Default for RabbitMqBrokerConfig {
    fn default() -> Self {
        Self {
            vhost: "/".to_string(),
            username: "guest".to_string(),
            password: "guest".to_string(),
            exchange: DEFAULT_EXCHANGE.to_string(),
            exchange_type: "topic".to_string(),
            declare_exchange: false,
            persistent: true,
            content_type: Some("application/json".to_string()),
            mandatory: false,
        }
    }
}

impl RabbitMqBrokerConfig {
    /// Build the AMQP URI for a broker endpoint
    pub fn amqp_uri(&self, host: &str, port: u16) -> String {
        // The default vhost "/" must be URL-encoded as "%2f"
        let encoded_vhost = urlencoding::encode(&self.vhost);
        format!(
            "amqp://{}:{}@{}:{}/{}",
            self.username, self.password, host, port, encoded_vhost
        )
    }

    pub fn from_flat_config(config: &FlatConfig) -> ElementResult<Self> {
        let mut parsed = Self::default();

        if let Some(vhost) = config.get("rabbitmq.vhost") {
            parsed.vhost = vhost.to_string();
        }
        if let Some(username) = config.get("rabbitmq.username") {
            parsed.username = username.to_string();
        }
        if let Some(password) = config.get("rabbitmq.password") {
            parsed.password = password.to_string();
        }
        if let Some(exchange) = config.get("rabbitmq.exchange") {
            parsed.exchange = exchange.to_string();
        }
        if let Some(exchange_type) = config.get("rabbitmq.exchange.type") {
            parsed.exchange_type = exchange_type.to_string();
        }
        if let Some(declare) = config.get_parsed("rabbitmq.declare.exchange")? {
            parsed.declare_exchange = declare;
        }
        if let Some(persistent) = config.get_parsed("rabbitmq.persistent")? {
            parsed.persistent = persistent;
        }
        if let Some(content_type) = config.get("rabbitmq.content.type") {
            parsed.content_type = Some(content_type.to_string());
        }
        if let Some(mandatory) = config.get_parsed("rabbitmq.mandatory")? {
            parsed.mandatory = mandatory;
        }

        Ok(parsed)
    }

    pub fn exchange_kind(&self) -> lapin::ExchangeKind {
        match self.exchange_type.as_str() {
            "fanout" => lapin::ExchangeKind::Fanout,
            "direct" => lapin::ExchangeKind::Direct,
            "headers" => lapin::ExchangeKind::Headers,
            _ => lapin::ExchangeKind::Topic,
        }
    }

    fn basic_properties(&self) -> lapin::BasicProperties {
        let mut properties = lapin::BasicProperties::default();
        if self.persistent {
            properties = properties.with_delivery_mode(2);
        }
        if let Some(ref content_type) = self.content_type {
            properties = properties.with_content_type(content_type.as_str().into());
        }
        properties
    }
}

/// Drives lapin futures from synchronous element code.
enum Executor {
    /// Runtime created because the caller was outside any runtime
    Owned(tokio::runtime::Runtime),
    /// Handle of the runtime the connection was opened in
    Shared(tokio::runtime::Handle),
}

impl Executor {
    fn acquire() -> ElementResult<Self> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => Ok(Executor::Shared(handle)),
            Err(_) => tokio::runtime::Runtime::new().map(Executor::Owned).map_err(|e| {
                ElementError::runtime(format!("Failed to create tokio runtime: {}", e))
            }),
        }
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        match self {
            Executor::Owned(runtime) => runtime.block_on(future),
            Executor::Shared(handle) => {
                if tokio::runtime::Handle::try_current().is_ok() {
                    tokio::task::block_in_place(|| handle.block_on(future))
                } else {
                    handle.block_on(future)
                }
            }
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Executor::Owned(_) => f.write_str("Executor::Owned"),
            Executor::Shared(_) => f.write_str("Executor::Shared"),
        }
    }
}

struct ConnectionState {
    connection: lapin::Connection,
    channel: lapin::Channel,
}

impl std::fmt::Debug for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionState")
            .field("channel", &self.channel.id())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RabbitMqConnector {
    config: RabbitMqBrokerConfig,
}

impl RabbitMqConnector {
    pub fn new(config: RabbitMqBrokerConfig) -> Self {
        Self { config }
    }

    pub fn from_flat_config(config: &FlatConfig) -> ElementResult<Self> {
        Ok(Self::new(RabbitMqBrokerConfig::from_flat_config(config)?))
    }

    pub fn config(&self) -> &RabbitMqBrokerConfig {
        &self.config
    }
}

impl BrokerConnector for RabbitMqConnector {
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        destination: &str,
    ) -> ElementResult<Box<dyn BrokerConnection>> {
        let executor = Executor::acquire()?;
        let config = self.config.clone();
        let uri = config.amqp_uri(host, port);

        log::info!("[RabbitMqConnector] Connecting to {}:{}", host, port);
        let state = executor.block_on(async {
            let connection =
                lapin::Connection::connect(&uri, lapin::ConnectionProperties::default())
                    .await
                    .map_err(|e| {
                        ElementError::connection_unavailable_with_source(
                            format!("Failed to connect to RabbitMQ at {}:{}: {}", host, port, e),
                            Box::new(e),
                        )
                    })?;

            let channel = connection.create_channel().await.map_err(|e| {
                ElementError::connection_unavailable_with_source(
                    format!("Failed to create channel: {}", e),
                    Box::new(e),
                )
            })?;

            channel
                .confirm_select(lapin::options::ConfirmSelectOptions::default())
                .await
                .map_err(|e| {
                    ElementError::connection_unavailable_with_source(
                        format!("Failed to enable publisher confirms: {}", e),
                        Box::new(e),
                    )
                })?;

            if config.declare_exchange {
                channel
                    .exchange_declare(
                        &config.exchange,
                        config.exchange_kind(),
                        lapin::options::ExchangeDeclareOptions {
                            durable: true,
                            ..Default::default()
                        },
                        lapin::types::FieldTable::default(),
                    )
                    .await
                    .map_err(|e| {
                        ElementError::configuration_with_key(
                            format!("Failed to declare exchange '{}': {}", config.exchange, e),
                            "rabbitmq.exchange",
                        )
                    })?;
            }

            Ok::<_, ElementError>(ConnectionState {
                connection,
                channel,
            })
        })?;

        log::info!(
            "[RabbitMqConnector] Connected, publishing to exchange '{}' with routing key '{}'",
            config.exchange,
            destination
        );

        Ok(Box::new(RabbitMqConnection {
            properties: config.basic_properties(),
            config,
            routing_key: destination.to_string(),
            state: Some(state),
            executor,
        }))
    }
}

/// Channels run in confirm mode, so only an ack without a returned message counts
fn check_confirmation(confirmation: Confirmation, routing_key: &str) -> ElementResult<()> {
    match confirmation {
        Confirmation::Ack(None) => Ok(()),
        Confirmation::Ack(Some(_)) => Err(ElementError::publish_failed(format!(
            "Message for '{}' was returned as unroutable",
            routing_key
        ))),
        Confirmation::Nack(_) => Err(ElementError::publish_failed(format!(
            "Broker rejected message for '{}'",
            routing_key
        ))),
        Confirmation::NotRequested => Err(ElementError::publish_failed(
            "Channel is not in confirm mode",
        )),
    }
}

#[derive(Debug)]
pub struct RabbitMqConnection {
    config: RabbitMqBrokerConfig,
    routing_key: String,
    properties: lapin::BasicProperties,
    state: Option<ConnectionState>,
    executor: Executor,
}

impl BrokerConnection for RabbitMqConnection {
    fn publish(&mut self, payload: &[u8]) -> ElementResult<()> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| ElementError::connection_unavailable("RabbitMQ connection closed"))?;
        let exchange = self.config.exchange.as_str();
        let routing_key = self.routing_key.as_str();
        let properties = self.properties.clone();
        let publish_options = lapin::options::BasicPublishOptions {
            mandatory: self.config.mandatory,
            ..Default::default()
        };

        let confirmation = self.executor.block_on(async {
            state
                .channel
                .basic_publish(exchange, routing_key, publish_options, payload, properties)
                .await
                .map_err(|e| ElementError::publish_failed(format!("Publish failed: {}", e)))?
                .await
                .map_err(|e| {
                    ElementError::publish_failed(format!("Publish confirmation failed: {}", e))
                })
        })?;
        check_confirmation(confirmation, routing_key)
    }

    fn disconnect(&mut self) -> ElementResult<()> {
        let Some(state) = self.state.take() else {
            return Ok(());
        };

        self.executor.block_on(async {
            if let Err(e) = state.channel.close(200, "Normal shutdown").await {
                log::warn!("[RabbitMqConnection] Error closing channel: {}", e);
            }
            state
                .connection
                .close(200, "Normal shutdown")
                .await
                .map_err(|e| {
                    ElementError::connection_unavailable_with_source(
                        format!("Error closing connection: {}", e),
                        Box::new(e),
                    )
                })
        })
    }
}
