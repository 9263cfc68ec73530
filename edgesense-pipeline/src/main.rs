//! EdgeSense pipeline entry point: bootstrap and MQTT event loop.

use anyhow::{Context, Result};
use edgesense_pipeline::actuation::{ActuationClient, SharedActuationClient};
use edgesense_pipeline::mqtt::{
    MqttSink, DESIRED_CONFIG_TOPIC, READING_TOPIC, REPORTED_CONFIG_TOPIC, SCORED_TOPIC,
};
use edgesense_pipeline::pipeline;
use edgesense_pipeline::settings::Settings;
use edgesense_pipeline::store::{ConfigStore, RuntimeConfig, SharedConfigStore};
use edgesense_pipeline::sync;
use parking_lot::RwLock;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().init();

    let settings = Settings::from_env();
    info!(
        broker = %settings.mqtt_host,
        port = settings.mqtt_port,
        "EdgeSense pipeline starting"
    );

    // Store and actuation client start at the hardcoded defaults; the
    // retained desired-configuration message (if any) reconciles them right
    // after subscribe, which is the startup fetch.
    let config = RuntimeConfig::default();
    let actuation: SharedActuationClient = Arc::new(RwLock::new(ActuationClient::new(
        config.thresholds.actuation_endpoint.clone(),
    )));
    let store: SharedConfigStore = Arc::new(ConfigStore::new(config));

    let mut options = MqttOptions::new(
        &settings.mqtt_client_id,
        &settings.mqtt_host,
        settings.mqtt_port,
    );
    options.set_keep_alive(Duration::from_secs(settings.keep_alive_secs));

    let (client, mut eventloop) = AsyncClient::new(options, 10);
    client
        .subscribe(READING_TOPIC, QoS::AtLeastOnce)
        .await
        .context("failed to subscribe to reading topic")?;
    client
        .subscribe(DESIRED_CONFIG_TOPIC, QoS::AtLeastOnce)
        .await
        .context("failed to subscribe to desired-configuration topic")?;

    let forward_sink = MqttSink::new(client.clone(), SCORED_TOPIC);
    let echo_sink = MqttSink::new(client.clone(), REPORTED_CONFIG_TOPIC);

    info!("connected to broker, processing readings");

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Incoming::Publish(publish))) => {
                let payload = publish.payload.to_vec();
                match publish.topic.as_str() {
                    READING_TOPIC => {
                        // One task per reading: a slow gateway notification
                        // must not stall the event loop or later readings.
                        let store = store.clone();
                        let sink = forward_sink.clone();
                        let actuation = actuation.clone();
                        tokio::spawn(async move {
                            pipeline::handle_reading(&payload, &store, &sink, &actuation).await;
                        });
                    }
                    DESIRED_CONFIG_TOPIC => {
                        let store = store.clone();
                        let sink = echo_sink.clone();
                        let actuation = actuation.clone();
                        tokio::spawn(async move {
                            if let Err(e) =
                                sync::handle_push(&payload, &store, &sink, &actuation).await
                            {
                                warn!(error = %e, "desired configuration push not applied");
                            }
                        });
                    }
                    other => {
                        warn!(topic = other, "message on unexpected topic ignored");
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "MQTT connection error");
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
