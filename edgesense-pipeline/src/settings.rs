//! Bootstrap settings.
//!
//! Broker coordinates only, resolved once at startup from the environment
//! (a `.env` file is honored via dotenvy in main). Runtime thresholds and
//! classifier parameters are NOT configured here; those arrive through the
//! desired-configuration topic and live in the [`crate::store`].

#[derive(Debug, Clone)]
pub struct Settings {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_client_id: String,
    pub keep_alive_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mqtt_host: "localhost".to_string(),
            mqtt_port: 1883,
            mqtt_client_id: "edgesense-pipeline".to_string(),
            keep_alive_secs: 30,
        }
    }
}

impl Settings {
    /// Environment overrides on top of the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mqtt_host: std::env::var("EDGESENSE_MQTT_HOST").unwrap_or(defaults.mqtt_host),
            mqtt_port: std::env::var("EDGESENSE_MQTT_PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.mqtt_port),
            mqtt_client_id: std::env::var("EDGESENSE_CLIENT_ID")
                .unwrap_or(defaults.mqtt_client_id),
            keep_alive_secs: defaults.keep_alive_secs,
        }
    }
}
