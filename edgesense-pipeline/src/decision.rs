//! Forward/drop policy.
//!
//! A threshold-band violation is always more actionable than a statistical
//! anomaly and escalates to Critical regardless of the anomaly flag; an
//! anomaly alone forwards at Warning.

use crate::models::{ScoredReading, Severity};
use crate::store::ThresholdConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub forward: bool,
    pub severity: Severity,
}

/// Combines the anomaly flag with the four-sided band check.
///
/// Band bounds are exclusive on both sides: a reading exactly at a bound is
/// in-band.
pub fn decide(scored: &ScoredReading, thresholds: &ThresholdConfig) -> Decision {
    let mut forward = scored.is_anomaly;
    let mut severity = Severity::Warning;

    let temperature_out_of_band = scored.reading.temperature > thresholds.temp_upper
        || scored.reading.temperature < thresholds.temp_lower;
    let humidity_out_of_band = scored.reading.humidity > thresholds.hum_upper
        || scored.reading.humidity < thresholds.hum_lower;

    if temperature_out_of_band || humidity_out_of_band {
        forward = true;
        severity = Severity::Critical;
    }

    Decision { forward, severity }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Reading;
    use chrono::Utc;

    fn thresholds() -> ThresholdConfig {
        ThresholdConfig {
            temp_upper: 35.0,
            temp_lower: 10.0,
            hum_upper: 90.0,
            hum_lower: 30.0,
            actuation_endpoint: String::new(),
        }
    }

    fn scored(temperature: f64, humidity: f64, is_anomaly: bool) -> ScoredReading {
        ScoredReading::new(
            Reading {
                temperature,
                humidity,
                time_created: Utc::now(),
            },
            is_anomaly,
        )
    }

    #[test]
    fn in_band_non_anomaly_is_dropped() {
        let decision = decide(&scored(25.0, 60.0, false), &thresholds());
        assert!(!decision.forward);
    }

    #[test]
    fn anomaly_alone_forwards_at_warning() {
        let decision = decide(&scored(25.0, 60.0, true), &thresholds());
        assert!(decision.forward);
        assert_eq!(decision.severity, Severity::Warning);
    }

    #[test]
    fn band_violation_is_critical_regardless_of_anomaly_flag() {
        for is_anomaly in [false, true] {
            let decision = decide(&scored(42.0, 60.0, is_anomaly), &thresholds());
            assert!(decision.forward);
            assert_eq!(decision.severity, Severity::Critical);
        }
    }

    #[test]
    fn each_band_side_escalates() {
        let t = thresholds();
        assert_eq!(decide(&scored(36.0, 60.0, false), &t).severity, Severity::Critical); // temp high
        assert_eq!(decide(&scored(9.0, 60.0, false), &t).severity, Severity::Critical); // temp low
        assert_eq!(decide(&scored(25.0, 95.0, false), &t).severity, Severity::Critical); // hum high
        assert_eq!(decide(&scored(25.0, 20.0, false), &t).severity, Severity::Critical); // hum low
    }

    #[test]
    fn reading_exactly_at_a_bound_is_in_band() {
        let t = thresholds();
        assert!(!decide(&scored(35.0, 60.0, false), &t).forward);
        assert!(!decide(&scored(10.0, 60.0, false), &t).forward);
        assert!(!decide(&scored(25.0, 90.0, false), &t).forward);
        assert!(!decide(&scored(25.0, 30.0, false), &t).forward);
    }

    #[test]
    fn inconsistent_bounds_produce_the_literal_comparison() {
        // Operator pushed lower > upper; everything in the inverted gap is
        // outside both bounds, so it escalates. No panic either way.
        let mut t = thresholds();
        t.temp_lower = 40.0;
        let decision = decide(&scored(37.0, 60.0, false), &t);
        assert!(decision.forward);
        assert_eq!(decision.severity, Severity::Critical);
    }

    #[test]
    fn documented_stream_example() {
        // Stream {30,50},{42,50},{20,95},{25,60}, no anomalies flagged:
        // drop, forward(Critical temp-high), forward(Critical hum-high), drop.
        let t = thresholds();
        let outcomes: Vec<Decision> = [(30.0, 50.0), (42.0, 50.0), (20.0, 95.0), (25.0, 60.0)]
            .into_iter()
            .map(|(temp, hum)| decide(&scored(temp, hum, false), &t))
            .collect();

        assert!(!outcomes[0].forward);
        assert!(outcomes[1].forward);
        assert_eq!(outcomes[1].severity, Severity::Critical);
        assert!(outcomes[2].forward);
        assert_eq!(outcomes[2].severity, Severity::Critical);
        assert!(!outcomes[3].forward);
    }
}
