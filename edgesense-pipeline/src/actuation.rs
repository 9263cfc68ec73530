//! Machine gateway notification.
//!
//! One client bound to one endpoint URL; the synchronizer rebuilds it when
//! the endpoint changes. A notification is a single POST with no retry, no
//! backoff and no circuit breaker; the engine never conditions telemetry
//! forwarding on its outcome.

use crate::models::ActuationCommand;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// HTTP request timeout for a single notification attempt.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ActuationError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("actuation request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway answered with something other than HTTP 200.
    #[error("actuator returned HTTP {0}")]
    Status(u16),
}

/// Client bound to the resolved actuation endpoint.
#[derive(Debug, Clone)]
pub struct ActuationClient {
    endpoint: String,
    http: reqwest::Client,
}

/// Handle shared between the pipeline (reads) and the synchronizer
/// (rebuilds on endpoint change).
pub type SharedActuationClient = Arc<RwLock<ActuationClient>>;

impl ActuationClient {
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest HTTP client");
        Self {
            endpoint: endpoint.into(),
            http,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Serialize the command and POST it to the bound endpoint.
    ///
    /// Success is strictly HTTP 200. At most one attempt per escalation.
    pub async fn notify(&self, command: &ActuationCommand) -> Result<(), ActuationError> {
        let response = self.http.post(&self.endpoint).json(command).send().await?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(ActuationError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    /// Blocking convenience wrapper for non-async callers.
    ///
    /// Runs [`ActuationClient::notify`] on a dedicated current-thread
    /// runtime and reports the outcome as a boolean, logging any failure.
    /// Must not be called from within an async runtime.
    pub fn notify_blocking(&self, command: &ActuationCommand) -> bool {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "failed to build runtime for blocking actuation call");
                return false;
            }
        };

        match runtime.block_on(self.notify(command)) {
            Ok(()) => true,
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "actuation notification failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn command(level: Severity) -> ActuationCommand {
        ActuationCommand {
            temperature: 42.0,
            humidity: 95.0,
            command_level: level,
        }
    }

    /// Bind then drop a listener so the port is very likely refused.
    fn dead_endpoint() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn transport_failure_is_a_request_error() {
        let client = ActuationClient::new(dead_endpoint());
        let err = client.notify(&command(Severity::Critical)).await.unwrap_err();
        assert!(matches!(err, ActuationError::Request(_)));
    }

    #[test]
    fn blocking_wrapper_reports_failure_as_false() {
        let client = ActuationClient::new(dead_endpoint());
        assert!(!client.notify_blocking(&command(Severity::Warning)));
    }

    #[test]
    fn status_error_names_the_code() {
        let err = ActuationError::Status(500);
        assert_eq!(err.to_string(), "actuator returned HTTP 500");
    }
}
