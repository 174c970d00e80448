use crate::{messaging::config::RabbitMqConfig, model::structures::grade_change::GradeChange};
use chrono::{DateTime, Utc};
use lapin::{
    options::{BasicPublishOptions, ExchangeDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

const CONTENT_TYPE: &str = "application/json";
const MESSAGE_TYPE: &str = "grading.GradeChanged";

#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("Failed to connect to RabbitMQ: {0}")]
    ConnectionError(#[from] lapin::Error),

    #[error("Failed to serialize message: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Publisher not initialized")]
    NotInitialized
}

/// Envelope for one grade change event
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradeChangedMessage {
    pub message_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub message_type: String,
    pub message: GradeChange,
    pub sent_time: DateTime<Utc>
}

impl GradeChangedMessage {
    pub fn new(change: GradeChange, correlation_id: Option<String>) -> Self {
        GradeChangedMessage {
            message_id: Uuid::new_v4(),
            correlation_id,
            message_type: MESSAGE_TYPE.to_string(),
            message: change,
            sent_time: Utc::now()
        }
    }
}

/// RabbitMQ publisher for grade change events
pub struct RabbitMqPublisher {
    connection: Option<Connection>,
    channel: Option<Channel>,
    exchange: String,
    routing_key: String
}

impl RabbitMqPublisher {
    pub fn new(exchange: String, routing_key: String) -> Self {
        Self {
            connection: None,
            channel: None,
            exchange,
            routing_key
        }
    }

    pub fn from_config(config: &RabbitMqConfig) -> Self {
        Self::new(config.exchange.clone(), config.routing_key.clone())
    }

    /// Creates and connects a publisher from configuration
    pub async fn connect_from_config(config: &RabbitMqConfig) -> Result<Self, PublisherError> {
        let mut publisher = Self::from_config(config);
        publisher.connect(&config.connection_url()).await?;
        Ok(publisher)
    }

    /// Connects and declares the durable fanout exchange
    pub async fn connect(&mut self, rabbitmq_url: &str) -> Result<(), PublisherError> {
        let connection = Connection::connect(rabbitmq_url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        channel
            .exchange_declare(
                &self.exchange,
                ExchangeKind::Fanout,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default()
            )
            .await?;

        self.connection = Some(connection);
        self.channel = Some(channel);

        info!(exchange = %self.exchange, routing_key = %self.routing_key, "Connected to RabbitMQ");
        Ok(())
    }

    pub async fn publish_grade_change(
        &self,
        change: &GradeChange,
        correlation_id: Option<String>
    ) -> Result<(), PublisherError> {
        let channel = self.channel.as_ref().ok_or(PublisherError::NotInitialized)?;

        let envelope = GradeChangedMessage::new(change.clone(), correlation_id);
        let payload = serde_json::to_vec(&envelope)?;

        channel
            .basic_publish(
                &self.exchange,
                &self.routing_key,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default()
                    .with_content_type(CONTENT_TYPE.into())
                    .with_message_id(envelope.message_id.to_string().into())
                    .with_timestamp(envelope.sent_time.timestamp() as u64)
            )
            .await?;

        debug!(
            player_id = change.player_id,
            kind = ?change.kind,
            from = %change.previous_code,
            to = %change.current_code,
            "Published grade change"
        );

        Ok(())
    }

    /// Publishes every change, returning how many were sent before the first failure.
    pub async fn publish_all(
        &self,
        changes: &[GradeChange],
        correlation_id: Option<String>
    ) -> Result<usize, PublisherError> {
        for (sent, change) in changes.iter().enumerate() {
            if let Err(e) = self.publish_grade_change(change, correlation_id.clone()).await {
                warn!(sent, total = changes.len(), error = %e, "Stopped publishing grade changes");
                return Err(e);
            }
        }

        Ok(changes.len())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some() && self.channel.is_some()
    }

    pub async fn close(&mut self) -> Result<(), PublisherError> {
        if let Some(channel) = self.channel.take() {
            channel.close(200, "Normal shutdown").await?;
        }

        if let Some(connection) = self.connection.take() {
            connection.close(200, "Normal shutdown").await?;
        }

        info!("RabbitMQ connection closed");
        Ok(())
    }
}

impl Drop for RabbitMqPublisher {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("RabbitMQ publisher dropped without proper closure");
        }
    }
}
