//! Shared runtime configuration store.
//!
//! One logical copy per process. The synchronizer swaps the whole record
//! atomically; readers take a snapshot and can never observe a half-updated
//! record (e.g. a new temp_upper with an old temp_lower).

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_TEMP_UPPER: f64 = 35.0;
pub const DEFAULT_TEMP_LOWER: f64 = 10.0;
pub const DEFAULT_HUM_UPPER: f64 = 90.0;
pub const DEFAULT_HUM_LOWER: f64 = 30.0;
pub const DEFAULT_ACTUATION_ENDPOINT: &str = "http://machine-gateway:3000/";

/// Operator-configured acceptable band plus the gateway endpoint.
///
/// temp_lower <= temp_upper (and same for humidity) is a target property
/// only: an operator can push inconsistent bounds and the engine produces
/// the literal comparison result without crashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub temp_upper: f64,
    pub temp_lower: f64,
    pub hum_upper: f64,
    pub hum_lower: f64,
    pub actuation_endpoint: String,
}

/// Externally supplied statistical parameters for the anomaly classifier.
///
/// Not learned online. A zero std-dev degrades that axis to exact-match
/// semantics (see classifier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierParams {
    pub temp_mean: f64,
    pub temp_std_dev: f64,
    pub hum_mean: f64,
    pub hum_std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub thresholds: ThresholdConfig,
    pub classifier: ClassifierParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig {
                temp_upper: DEFAULT_TEMP_UPPER,
                temp_lower: DEFAULT_TEMP_LOWER,
                hum_upper: DEFAULT_HUM_UPPER,
                hum_lower: DEFAULT_HUM_LOWER,
                actuation_endpoint: DEFAULT_ACTUATION_ENDPOINT.to_string(),
            },
            classifier: ClassifierParams {
                temp_mean: 0.0,
                temp_std_dev: 0.0,
                hum_mean: 0.0,
                hum_std_dev: 0.0,
            },
        }
    }
}

/// Thread-safe handle to the live configuration record.
#[derive(Debug)]
pub struct ConfigStore {
    inner: RwLock<RuntimeConfig>,
}

pub type SharedConfigStore = Arc<ConfigStore>;

impl ConfigStore {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            inner: RwLock::new(config),
        }
    }

    /// Whole-record copy under the read lock.
    pub fn snapshot(&self) -> RuntimeConfig {
        self.inner.read().clone()
    }

    /// Atomic whole-record swap under the write lock.
    pub fn replace(&self, config: RuntimeConfig) {
        *self.inner.write() = config;
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}
