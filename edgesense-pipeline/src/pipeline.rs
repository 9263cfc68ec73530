//! Per-reading orchestration: decode, score, decide, forward, actuate.
//!
//! Every outcome is reported as a typed value and logged; nothing here ever
//! raises to the transport loop.

use crate::actuation::{ActuationError, SharedActuationClient};
use crate::classifier::classify;
use crate::decision::decide;
use crate::models::{ActuationCommand, Reading, ScoredReading, Severity};
use crate::mqtt::{OutboundSink, PublishError};
use crate::store::ConfigStore;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
#[error("invalid reading payload: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("failed to encode scored reading: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// What happened to the actuation side effect of a forwarded reading.
#[derive(Debug)]
pub enum ActuationOutcome {
    /// No endpoint configured; no call attempted.
    Skipped,
    /// Gateway acknowledged with HTTP 200.
    Delivered,
    /// Call attempted and failed; the forward already happened and stands.
    Failed(ActuationError),
}

/// Best-effort completion signal for one inbound message.
#[derive(Debug)]
pub enum ReadingOutcome {
    /// Malformed payload: dropped, no forward, no actuation.
    Rejected { error: DecodeError },
    /// Policy said drop: no downstream effect.
    Dropped { scored: ScoredReading },
    /// Forward publish failed; actuation is not attempted.
    ForwardFailed { error: ForwardError },
    /// Scored reading re-emitted downstream.
    Forwarded {
        scored: ScoredReading,
        severity: Severity,
        actuation: ActuationOutcome,
    },
}

/// Entry point for one inbound reading payload.
pub async fn handle_reading<S: OutboundSink>(
    payload: &[u8],
    store: &ConfigStore,
    forward_sink: &S,
    actuation: &SharedActuationClient,
) -> ReadingOutcome {
    let reading: Reading = match serde_json::from_slice(payload) {
        Ok(reading) => reading,
        Err(e) => {
            warn!(error = %e, "dropping malformed reading payload");
            return ReadingOutcome::Rejected { error: e.into() };
        }
    };

    let config = store.snapshot();
    let is_anomaly = classify(&reading, &config.classifier);
    let scored = ScoredReading::new(reading, is_anomaly);
    let decision = decide(&scored, &config.thresholds);

    if !decision.forward {
        info!(
            temperature = scored.reading.temperature,
            humidity = scored.reading.humidity,
            "reading within band and not anomalous, dropping"
        );
        return ReadingOutcome::Dropped { scored };
    }

    let encoded = match serde_json::to_string(&scored) {
        Ok(encoded) => encoded,
        Err(e) => {
            error!(error = %e, "failed to encode scored reading");
            return ReadingOutcome::ForwardFailed {
                error: ForwardError::Encode(e),
            };
        }
    };

    if let Err(e) = forward_sink.publish(encoded).await {
        error!(error = %e, "failed to forward scored reading");
        return ReadingOutcome::ForwardFailed { error: e.into() };
    }
    info!(
        temperature = scored.reading.temperature,
        humidity = scored.reading.humidity,
        anomaly = scored.is_anomaly,
        severity = ?decision.severity,
        "scored reading forwarded"
    );

    // The forward succeeded; actuation is an independent effect and its
    // failure must not undo or mask it.
    let client = actuation.read().clone();
    let outcome = if client.endpoint().is_empty() {
        debug!("no actuation endpoint configured, skipping notification");
        ActuationOutcome::Skipped
    } else {
        let command = ActuationCommand::new(&scored, decision.severity);
        match client.notify(&command).await {
            Ok(()) => {
                info!(endpoint = client.endpoint(), level = command.command_level.ordinal(), "machine gateway notified");
                ActuationOutcome::Delivered
            }
            Err(e) => {
                warn!(endpoint = client.endpoint(), error = %e, "machine gateway notification failed");
                ActuationOutcome::Failed(e)
            }
        }
    };

    ReadingOutcome::Forwarded {
        scored,
        severity: decision.severity,
        actuation: outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuation::ActuationClient;
    use crate::store::{ClassifierParams, RuntimeConfig};
    use parking_lot::{Mutex, RwLock};
    use std::sync::Arc;

    /// Default classifier params are zeroed (exact-match semantics), which
    /// would flag every reading; give tests a wide, quiet distribution.
    fn quiet_classifier() -> ClassifierParams {
        ClassifierParams {
            temp_mean: 25.0,
            temp_std_dev: 100.0,
            hum_mean: 60.0,
            hum_std_dev: 100.0,
        }
    }

    fn quiet_store() -> ConfigStore {
        let mut config = RuntimeConfig::default();
        config.classifier = quiet_classifier();
        ConfigStore::new(config)
    }

    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<String>>,
        fail: bool,
    }

    impl OutboundSink for RecordingSink {
        async fn publish(&self, payload: String) -> Result<(), PublishError> {
            if self.fail {
                return Err(PublishError::Unavailable("test sink closed".into()));
            }
            self.messages.lock().push(payload);
            Ok(())
        }
    }

    fn reading_payload(temperature: f64, humidity: f64) -> Vec<u8> {
        format!(
            r#"{{"temperature":{temperature},"humidity":{humidity},"timeCreated":"2024-03-01T12:00:00Z"}}"#
        )
        .into_bytes()
    }

    fn actuation_handle(endpoint: &str) -> SharedActuationClient {
        Arc::new(RwLock::new(ActuationClient::new(endpoint)))
    }

    /// Bind then drop a listener so the port is refused.
    fn dead_endpoint() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected_without_forward() {
        let store = quiet_store();
        let sink = RecordingSink::default();
        let outcome = handle_reading(
            br#"{"temperature":21.0}"#,
            &store,
            &sink,
            &actuation_handle(""),
        )
        .await;

        assert!(matches!(outcome, ReadingOutcome::Rejected { .. }));
        assert!(sink.messages.lock().is_empty());
    }

    #[tokio::test]
    async fn in_band_reading_is_dropped_with_no_effects() {
        let store = quiet_store();
        let sink = RecordingSink::default();
        // Dead endpoint: an attempted call would show up as Failed, not Skipped.
        let actuation = actuation_handle(&dead_endpoint());

        let outcome =
            handle_reading(&reading_payload(25.0, 60.0), &store, &sink, &actuation).await;

        assert!(matches!(outcome, ReadingOutcome::Dropped { .. }));
        assert!(sink.messages.lock().is_empty());
    }

    #[tokio::test]
    async fn band_violation_forwards_scored_reading() {
        let store = quiet_store();
        let sink = RecordingSink::default();

        let outcome =
            handle_reading(&reading_payload(42.0, 50.0), &store, &sink, &actuation_handle("")).await;

        match outcome {
            ReadingOutcome::Forwarded {
                severity, actuation, ..
            } => {
                assert_eq!(severity, Severity::Critical);
                assert!(matches!(actuation, ActuationOutcome::Skipped));
            }
            other => panic!("expected forward, got {other:?}"),
        }

        let messages = sink.messages.lock();
        assert_eq!(messages.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&messages[0]).unwrap();
        assert_eq!(value["temperature"], 42.0);
        assert_eq!(value["isAnomaly"], false);
    }

    #[tokio::test]
    async fn anomaly_only_forwards_at_warning() {
        let mut config = RuntimeConfig::default();
        config.classifier.temp_mean = 25.0;
        config.classifier.temp_std_dev = 1.0;
        config.classifier.hum_mean = 60.0;
        config.classifier.hum_std_dev = 10.0;
        let store = ConfigStore::new(config);
        let sink = RecordingSink::default();

        // Temperature z = 5, well in band.
        let outcome =
            handle_reading(&reading_payload(30.0, 60.0), &store, &sink, &actuation_handle("")).await;

        match outcome {
            ReadingOutcome::Forwarded { scored, severity, .. } => {
                assert!(scored.is_anomaly);
                assert_eq!(severity, Severity::Warning);
            }
            other => panic!("expected forward, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn actuation_failure_does_not_undo_the_forward() {
        let store = quiet_store();
        let sink = RecordingSink::default();
        let actuation = actuation_handle(&dead_endpoint());

        let outcome =
            handle_reading(&reading_payload(42.0, 50.0), &store, &sink, &actuation).await;

        match outcome {
            ReadingOutcome::Forwarded { actuation, .. } => {
                assert!(matches!(
                    actuation,
                    ActuationOutcome::Failed(ActuationError::Request(_))
                ));
            }
            other => panic!("expected forward, got {other:?}"),
        }
        // The scored reading went out before the failed notification.
        assert_eq!(sink.messages.lock().len(), 1);
    }

    #[tokio::test]
    async fn forward_failure_skips_actuation() {
        let store = quiet_store();
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        let outcome = handle_reading(
            &reading_payload(42.0, 50.0),
            &store,
            &sink,
            &actuation_handle(&dead_endpoint()),
        )
        .await;

        assert!(matches!(
            outcome,
            ReadingOutcome::ForwardFailed {
                error: ForwardError::Publish(_)
            }
        ));
    }
}
