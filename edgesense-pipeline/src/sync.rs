//! Configuration synchronizer.
//!
//! Reconciles operator-pushed desired configuration against local state,
//! swaps the resolved record into the store atomically, rebuilds the
//! actuation client when the endpoint changed, and echoes the adopted
//! configuration back on the reported topic.
//!
//! Every push is a complete replacement of every recognized field: a field
//! absent from this particular push resets to its hardcoded default, it does
//! not retain the previously adopted value. Merge semantics are deliberately
//! NOT implemented.

use crate::actuation::{ActuationClient, SharedActuationClient};
use crate::mqtt::{OutboundSink, PublishError};
use crate::store::{ConfigStore, RuntimeConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Desired-configuration document as pushed by the operator.
///
/// Flat key/value JSON; unrecognized keys are ignored on read and never
/// echoed back. A recognized key set to `null` counts as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DesiredConfig {
    #[serde(rename = "tempUpper")]
    pub temp_upper: Option<f64>,
    #[serde(rename = "tempLower")]
    pub temp_lower: Option<f64>,
    #[serde(rename = "humUpper")]
    pub hum_upper: Option<f64>,
    #[serde(rename = "humLower")]
    pub hum_lower: Option<f64>,
    #[serde(rename = "actuationEndpoint")]
    pub actuation_endpoint: Option<String>,
    #[serde(rename = "tempMean")]
    pub temp_mean: Option<f64>,
    #[serde(rename = "tempStdDev")]
    pub temp_std_dev: Option<f64>,
    #[serde(rename = "humMean")]
    pub hum_mean: Option<f64>,
    #[serde(rename = "humStdDev")]
    pub hum_std_dev: Option<f64>,
}

impl DesiredConfig {
    /// A push with zero recognized fields is a no-op.
    pub fn is_empty(&self) -> bool {
        self.temp_upper.is_none()
            && self.temp_lower.is_none()
            && self.hum_upper.is_none()
            && self.hum_lower.is_none()
            && self.actuation_endpoint.is_none()
            && self.temp_mean.is_none()
            && self.temp_std_dev.is_none()
            && self.hum_mean.is_none()
            && self.hum_std_dev.is_none()
    }
}

/// Echo of the configuration actually adopted, so the operator can observe
/// what was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedConfig {
    #[serde(rename = "tempUpper")]
    pub temp_upper: f64,
    #[serde(rename = "tempLower")]
    pub temp_lower: f64,
    #[serde(rename = "humUpper")]
    pub hum_upper: f64,
    #[serde(rename = "humLower")]
    pub hum_lower: f64,
    #[serde(rename = "actuationEndpoint")]
    pub actuation_endpoint: String,
    #[serde(rename = "tempMean")]
    pub temp_mean: f64,
    #[serde(rename = "tempStdDev")]
    pub temp_std_dev: f64,
    #[serde(rename = "humMean")]
    pub hum_mean: f64,
    #[serde(rename = "humStdDev")]
    pub hum_std_dev: f64,
}

impl From<&RuntimeConfig> for ReportedConfig {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            temp_upper: config.thresholds.temp_upper,
            temp_lower: config.thresholds.temp_lower,
            hum_upper: config.thresholds.hum_upper,
            hum_lower: config.thresholds.hum_lower,
            actuation_endpoint: config.thresholds.actuation_endpoint.clone(),
            temp_mean: config.classifier.temp_mean,
            temp_std_dev: config.classifier.temp_std_dev,
            hum_mean: config.classifier.hum_mean,
            hum_std_dev: config.classifier.hum_std_dev,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The push was not a valid document (bad JSON or a type mismatch on a
    /// recognized field). The store is left untouched.
    #[error("invalid desired configuration: {0}")]
    Decode(#[from] serde_json::Error),

    /// The reported document could not be encoded (non-finite adopted
    /// value). The store has already been updated.
    #[error("failed to encode reported configuration: {0}")]
    Encode(#[source] serde_json::Error),

    /// The echo publish failed. The store has already been updated; the
    /// echo is never retried.
    #[error("failed to publish reported configuration: {0}")]
    Echo(#[source] PublishError),
}

#[derive(Debug)]
pub enum PushOutcome {
    /// Push carried no recognized field: no store write, no echo.
    Ignored,
    /// Resolved configuration swapped in and echoed back.
    Applied(ReportedConfig),
}

/// Adoption guard for numeric fields: present, non-null and non-zero.
fn adopt(field: Option<f64>, default: f64) -> f64 {
    match field {
        Some(value) if value != 0.0 => value,
        _ => default,
    }
}

/// Resolves a desired document into a full runtime configuration, filling
/// every omitted or invalid field with its hardcoded default.
pub fn resolve(desired: &DesiredConfig) -> RuntimeConfig {
    let defaults = RuntimeConfig::default();
    let mut resolved = defaults.clone();

    resolved.thresholds.temp_upper = adopt(desired.temp_upper, defaults.thresholds.temp_upper);
    resolved.thresholds.temp_lower = adopt(desired.temp_lower, defaults.thresholds.temp_lower);
    resolved.thresholds.hum_upper = adopt(desired.hum_upper, defaults.thresholds.hum_upper);
    resolved.thresholds.hum_lower = adopt(desired.hum_lower, defaults.thresholds.hum_lower);
    resolved.thresholds.actuation_endpoint = match desired.actuation_endpoint.as_deref() {
        Some(endpoint) if !endpoint.is_empty() => endpoint.to_string(),
        _ => defaults.thresholds.actuation_endpoint,
    };

    resolved.classifier.temp_mean = adopt(desired.temp_mean, defaults.classifier.temp_mean);
    resolved.classifier.temp_std_dev = adopt(desired.temp_std_dev, defaults.classifier.temp_std_dev);
    resolved.classifier.hum_mean = adopt(desired.hum_mean, defaults.classifier.hum_mean);
    resolved.classifier.hum_std_dev = adopt(desired.hum_std_dev, defaults.classifier.hum_std_dev);

    resolved
}

/// Entry point for one desired-configuration push.
///
/// The retained message delivered at subscribe time goes through the same
/// path, which makes the startup fetch and live pushes identical and
/// idempotent.
pub async fn handle_push<S: OutboundSink>(
    payload: &[u8],
    store: &ConfigStore,
    echo_sink: &S,
    actuation: &SharedActuationClient,
) -> Result<PushOutcome, SyncError> {
    let desired: DesiredConfig = serde_json::from_slice(payload)?;

    if desired.is_empty() {
        debug!("desired configuration push carries no recognized field, ignoring");
        return Ok(PushOutcome::Ignored);
    }

    let resolved = resolve(&desired);
    let endpoint_changed = actuation.read().endpoint() != resolved.thresholds.actuation_endpoint;

    store.replace(resolved.clone());
    info!(
        temp_upper = resolved.thresholds.temp_upper,
        temp_lower = resolved.thresholds.temp_lower,
        hum_upper = resolved.thresholds.hum_upper,
        hum_lower = resolved.thresholds.hum_lower,
        "desired configuration applied"
    );

    if endpoint_changed {
        let endpoint = resolved.thresholds.actuation_endpoint.clone();
        info!(endpoint = %endpoint, "actuation endpoint changed, rebuilding client");
        *actuation.write() = ActuationClient::new(endpoint);
    }

    let reported = ReportedConfig::from(&resolved);
    let encoded = serde_json::to_string(&reported).map_err(SyncError::Encode)?;
    echo_sink.publish(encoded).await.map_err(SyncError::Echo)?;

    Ok(PushOutcome::Applied(reported))
}
