/*!
Mock MQTT Client pour développement sans broker

Permet de développer et tester le pipeline EdgeSense sans démarrer un broker
MQTT réel. Enregistre tous les messages publiés et permet de simuler la
réception de lectures et de pushes de configuration.
*/

use chrono::Utc;
use rumqttc::QoS;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct MockMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

/// Mock MQTT Client qui simule rumqttc::AsyncClient
#[derive(Clone)]
pub struct MockMqttClient {
    published_messages: Arc<Mutex<Vec<MockMessage>>>,
    subscriptions: Arc<Mutex<Vec<String>>>,
    message_sender: Arc<Mutex<Option<mpsc::UnboundedSender<MockMessage>>>>,
}

impl MockMqttClient {
    pub fn new() -> Self {
        Self {
            published_messages: Arc::new(Mutex::new(Vec::new())),
            subscriptions: Arc::new(Mutex::new(Vec::new())),
            message_sender: Arc::new(Mutex::new(None)),
        }
    }

    /// Configuration d'un channel pour recevoir les messages simulés
    pub fn setup_receiver(&self) -> mpsc::UnboundedReceiver<MockMessage> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *self.message_sender.lock().unwrap() = Some(sender);
        receiver
    }

    /// Simule la publication d'un message (compatible avec AsyncClient)
    pub async fn publish<S, V>(&self, topic: S, qos: QoS, retain: bool, payload: V) -> Result<()>
    where
        S: Into<String>,
        V: Into<Vec<u8>>,
    {
        let message = MockMessage {
            topic: topic.into(),
            payload: payload.into(),
            qos,
            retain,
        };

        // Enregistrer le message
        self.published_messages.lock().unwrap().push(message.clone());

        log::info!("📤 [MOCK] Published to {}: {} bytes", message.topic, message.payload.len());
        Ok(())
    }

    /// Simule l'abonnement à un topic (compatible avec AsyncClient)
    pub async fn subscribe<S: Into<String>>(&self, topic: S, _qos: QoS) -> Result<()> {
        let topic = topic.into();
        self.subscriptions.lock().unwrap().push(topic.clone());
        log::info!("📥 [MOCK] Subscribed to {}", topic);
        Ok(())
    }

    /// Simule la réception d'un message (pour tests)
    pub async fn simulate_incoming<S, V>(&self, topic: S, payload: V) -> Result<()>
    where
        S: Into<String>,
        V: Into<Vec<u8>>,
    {
        let message = MockMessage {
            topic: topic.into(),
            payload: payload.into(),
            qos: QoS::AtLeastOnce,
            retain: false,
        };

        if let Some(sender) = self.message_sender.lock().unwrap().as_ref() {
            sender.send(message.clone()).map_err(|e| anyhow::anyhow!("Send error: {}", e))?;
        }

        log::info!("📨 [MOCK] Simulated incoming: {}", message.topic);
        Ok(())
    }

    /// Récupère tous les messages publiés (pour assertions de tests)
    pub fn get_published_messages(&self) -> Vec<MockMessage> {
        self.published_messages.lock().unwrap().clone()
    }

    /// Récupère les abonnements (pour assertions de tests)
    pub fn get_subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }

    /// Trouve les messages publiés sur un topic donné
    pub fn find_messages_by_topic(&self, topic: &str) -> Vec<MockMessage> {
        self.published_messages
            .lock()
            .unwrap()
            .iter()
            .filter(|msg| msg.topic == topic)
            .cloned()
            .collect()
    }

    /// Parse le dernier message d'un topic en JSON
    pub fn get_last_json_message<T>(&self, topic: &str) -> Result<Option<T>>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let messages = self.find_messages_by_topic(topic);
        if let Some(last_msg) = messages.last() {
            let parsed: T = serde_json::from_slice(&last_msg.payload)?;
            Ok(Some(parsed))
        } else {
            Ok(None)
        }
    }

    /// Reset tous les messages enregistrés
    pub fn clear(&self) {
        self.published_messages.lock().unwrap().clear();
        self.subscriptions.lock().unwrap().clear();
    }
}

impl Default for MockMqttClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper pour créer des messages de test formatés selon les contrats EdgeSense
pub struct EdgeMessageBuilder;

impl EdgeMessageBuilder {
    /// Crée une lecture telemetry.reading v1
    pub fn reading_v1(temperature: f64, humidity: f64) -> Value {
        serde_json::json!({
            "temperature": temperature,
            "humidity": humidity,
            "timeCreated": Utc::now().to_rfc3339()
        })
    }

    /// Crée une lecture scorée telemetry.scored v1
    pub fn scored_v1(temperature: f64, humidity: f64, is_anomaly: bool) -> Value {
        serde_json::json!({
            "temperature": temperature,
            "humidity": humidity,
            "timeCreated": Utc::now().to_rfc3339(),
            "isAnomaly": is_anomaly
        })
    }

    /// Crée un push config.desired v1 avec la bande de seuils complète
    pub fn desired_thresholds_v1(
        temp_upper: f64,
        temp_lower: f64,
        hum_upper: f64,
        hum_lower: f64,
    ) -> Value {
        serde_json::json!({
            "tempUpper": temp_upper,
            "tempLower": temp_lower,
            "humUpper": hum_upper,
            "humLower": hum_lower
        })
    }

    /// Crée un push config.desired v1 avec les paramètres du classifieur
    pub fn desired_classifier_v1(
        temp_mean: f64,
        temp_std_dev: f64,
        hum_mean: f64,
        hum_std_dev: f64,
    ) -> Value {
        serde_json::json!({
            "tempMean": temp_mean,
            "tempStdDev": temp_std_dev,
            "humMean": hum_mean,
            "humStdDev": hum_std_dev
        })
    }

    /// Crée une commande machine (niveau 0-3)
    pub fn machine_command_v1(temperature: f64, humidity: f64, command_level: u8) -> Value {
        serde_json::json!({
            "temperature": temperature,
            "humidity": humidity,
            "commandLevel": command_level
        })
    }
}
