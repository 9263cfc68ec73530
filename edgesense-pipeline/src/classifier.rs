//! Statistical anomaly classifier.
//!
//! Pure function of a reading and the configured mean/std-dev parameters;
//! safe to call from concurrent readings in flight.

use crate::models::Reading;
use crate::store::ClassifierParams;

/// Anomaly cutoff in standard deviations. A z-score must strictly exceed
/// this bound; a reading at exactly 3.0 deviations is not anomalous.
pub const ANOMALY_Z_SCORE_CUTOFF: f64 = 3.0;

/// Flags a reading as anomalous when either axis deviates by more than
/// [`ANOMALY_Z_SCORE_CUTOFF`] standard deviations from its configured mean.
pub fn classify(reading: &Reading, params: &ClassifierParams) -> bool {
    deviation_exceeds_cutoff(reading.temperature, params.temp_mean, params.temp_std_dev)
        || deviation_exceeds_cutoff(reading.humidity, params.hum_mean, params.hum_std_dev)
}

fn deviation_exceeds_cutoff(value: f64, mean: f64, std_dev: f64) -> bool {
    // NaN anywhere resolves non-anomalous. Conservative default so a
    // malformed sample never pages; not a correctness guarantee.
    if value.is_nan() || mean.is_nan() || std_dev.is_nan() {
        return false;
    }
    if std_dev == 0.0 {
        // Degenerate spread: exact match scores zero, anything else is an
        // infinite z-score.
        return value != mean;
    }
    (value - mean).abs() / std_dev > ANOMALY_Z_SCORE_CUTOFF
}
