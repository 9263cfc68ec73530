//! Broker topics and the outbound publish seam.
//!
//! The pipeline and the synchronizer publish through [`OutboundSink`] so
//! tests can swap the broker for a recording sink; production uses
//! [`MqttSink`] over the shared rumqttc client.

use rumqttc::{AsyncClient, QoS};
use std::future::Future;

/// Inbound telemetry readings.
pub const READING_TOPIC: &str = "edgesense/telemetry/reading@v1";
/// Scored readings forwarded to the downstream collector (JSON payload).
pub const SCORED_TOPIC: &str = "edgesense/telemetry/scored@v1";
/// Operator-pushed desired configuration (retained, so a fresh subscriber
/// receives the current document at startup).
pub const DESIRED_CONFIG_TOPIC: &str = "edgesense/config/desired@v1";
/// Echo of the configuration actually adopted.
pub const REPORTED_CONFIG_TOPIC: &str = "edgesense/config/reported@v1";

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("mqtt publish failed: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Sink rejected the message for a non-transport reason (test doubles).
    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

pub trait OutboundSink: Send + Sync {
    fn publish(&self, payload: String) -> impl Future<Output = Result<(), PublishError>> + Send;
}

/// Production sink: one topic, QoS AtLeastOnce, not retained.
#[derive(Clone)]
pub struct MqttSink {
    client: AsyncClient,
    topic: &'static str,
}

impl MqttSink {
    pub fn new(client: AsyncClient, topic: &'static str) -> Self {
        Self { client, topic }
    }
}

impl OutboundSink for MqttSink {
    async fn publish(&self, payload: String) -> Result<(), PublishError> {
        self.client
            .publish(self.topic, QoS::AtLeastOnce, false, payload)
            .await?;
        Ok(())
    }
}
