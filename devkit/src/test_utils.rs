/*!
Test Harness pour le pipeline EdgeSense

Facilite l'écriture de tests avec:
- Setup automatique du mock MQTT
- Simulation de lectures télémétrie et de pushes de configuration
- Assertions sur les messages échangés
*/

use crate::mqtt_stub::{EdgeMessageBuilder, MockMqttClient};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use anyhow::Result;

/// Topics des contrats EdgeSense (dupliqués ici pour que le devkit reste
/// indépendant du crate pipeline)
pub const READING_TOPIC: &str = "edgesense/telemetry/reading@v1";
pub const SCORED_TOPIC: &str = "edgesense/telemetry/scored@v1";
pub const DESIRED_CONFIG_TOPIC: &str = "edgesense/config/desired@v1";
pub const REPORTED_CONFIG_TOPIC: &str = "edgesense/config/reported@v1";

/// Harness de test complet pour le pipeline
pub struct TestHarness {
    pub mqtt_client: MockMqttClient,
    expectations: Vec<Expectation>,
}

#[derive(Debug)]
struct Expectation {
    topic: String,
    expected_count: usize,
}

impl TestHarness {
    /// Crée un nouveau harness de test
    pub fn new() -> Self {
        env_logger::try_init().ok(); // Init logging pour tests

        Self {
            mqtt_client: MockMqttClient::new(),
            expectations: Vec::new(),
        }
    }

    /// Ajoute une expectation: on s'attend à recevoir N messages sur un topic
    pub fn expect_messages(&mut self, topic: &str, count: usize) -> &mut Self {
        self.expectations.push(Expectation {
            topic: topic.to_string(),
            expected_count: count,
        });
        self
    }

    /// Simule l'arrivée d'une lecture télémétrie
    pub async fn send_reading(&self, temperature: f64, humidity: f64) -> Result<()> {
        let payload = EdgeMessageBuilder::reading_v1(temperature, humidity);
        let payload_bytes = serde_json::to_vec(&payload)?;

        self.mqtt_client.simulate_incoming(READING_TOPIC, payload_bytes).await?;
        log::info!("🌡️ Sent reading: {temperature}°C / {humidity}%");
        Ok(())
    }

    /// Simule un push de configuration désirée
    pub async fn send_desired_config(&self, desired: Value) -> Result<()> {
        let payload_bytes = serde_json::to_vec(&desired)?;

        self.mqtt_client.simulate_incoming(DESIRED_CONFIG_TOPIC, payload_bytes).await?;
        log::info!("⚙️ Sent desired config push");
        Ok(())
    }

    /// Attend et vérifie qu'un message a été publié sur un topic
    pub async fn wait_for_message(&self, topic: &str, timeout_ms: u64) -> Result<Option<Value>> {
        let start = std::time::Instant::now();

        while start.elapsed() < Duration::from_millis(timeout_ms) {
            if let Some(msg) = self.mqtt_client.get_last_json_message::<Value>(topic)? {
                log::info!("✅ Received expected message on {}", topic);
                return Ok(Some(msg));
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        log::warn!("⏰ Timeout waiting for message on {}", topic);
        Ok(None)
    }

    /// Vérifie toutes les expectations configurées
    pub fn verify_expectations(&self) -> Result<()> {
        log::info!("🔍 Verifying {} expectations...", self.expectations.len());

        for expectation in &self.expectations {
            let messages = self.mqtt_client.find_messages_by_topic(&expectation.topic);
            let actual_count = messages.len();

            if actual_count != expectation.expected_count {
                anyhow::bail!(
                    "Expectation failed for topic '{}': expected {} messages, got {}",
                    expectation.topic, expectation.expected_count, actual_count
                );
            }

            log::info!("✅ Topic '{}': {} messages as expected",
                      expectation.topic, actual_count);
        }

        Ok(())
    }

    /// Assert qu'un champ a une valeur spécifique dans le dernier message
    pub fn assert_field_equals(&self, topic: &str, field_path: &str, expected: &Value) -> Result<()> {
        if let Some(msg) = self.mqtt_client.get_last_json_message::<Value>(topic)? {
            if let Some(actual) = self.get_nested_field(&msg, field_path) {
                if actual == expected {
                    log::info!("✅ Field '{}' = {:?} in {}", field_path, expected, topic);
                    return Ok(());
                } else {
                    anyhow::bail!("Field '{}' mismatch: expected {:?}, got {:?}",
                                 field_path, expected, actual);
                }
            }
        }

        anyhow::bail!("Field '{}' not found for comparison in {}", field_path, topic);
    }

    fn get_nested_field<'a>(&self, value: &'a Value, path: &str) -> Option<&'a Value> {
        let parts: Vec<&str> = path.split('.').collect();
        let mut current = value;

        for part in parts {
            match current {
                Value::Object(obj) => {
                    current = obj.get(part)?;
                }
                _ => return None,
            }
        }

        Some(current)
    }

    /// Stats sur les messages collectés
    pub fn get_stats(&self) -> TestStats {
        let messages = self.mqtt_client.get_published_messages();
        let mut topic_counts = HashMap::new();

        for msg in &messages {
            *topic_counts.entry(msg.topic.clone()).or_insert(0) += 1;
        }

        TestStats {
            total_messages: messages.len(),
            topic_counts,
            subscriptions: self.mqtt_client.get_subscriptions(),
        }
    }

    /// Reset le harness pour un nouveau test
    pub fn reset(&mut self) {
        self.mqtt_client.clear();
        self.expectations.clear();
        log::info!("🧹 Test harness reset");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct TestStats {
    pub total_messages: usize,
    pub topic_counts: HashMap<String, usize>,
    pub subscriptions: Vec<String>,
}
