//! Wire types exchanged with the broker and the machine gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One timestamped temperature/humidity sample (matches telemetry.reading@v1 contract)
///
/// Unknown extra fields on the wire are ignored; a missing required field is
/// a deserialization error and the message is dropped upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub temperature: f64,
    pub humidity: f64,
    #[serde(rename = "timeCreated")]
    pub time_created: DateTime<Utc>,
}

/// A reading plus its anomaly flag (matches telemetry.scored@v1 contract)
///
/// Produced exactly once per reading by the classifier, never mutated after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredReading {
    #[serde(flatten)]
    pub reading: Reading,
    #[serde(rename = "isAnomaly")]
    pub is_anomaly: bool,
}

impl ScoredReading {
    pub fn new(reading: Reading, is_anomaly: bool) -> Self {
        Self { reading, is_anomaly }
    }
}

/// Escalation level attached to a machine interaction command.
///
/// Ordered Debug < Info < Warning < Critical; serialized as the integer
/// ordinal 0-3 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Critical = 3,
}

impl Severity {
    pub fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(Severity::Debug),
            1 => Some(Severity::Info),
            2 => Some(Severity::Warning),
            3 => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Severity::from_ordinal(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid severity ordinal: {value}")))
    }
}

/// Command POSTed to the machine gateway on escalation.
///
/// Built fresh from the original reading values per escalation; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuationCommand {
    pub temperature: f64,
    pub humidity: f64,
    #[serde(rename = "commandLevel")]
    pub command_level: Severity,
}

impl ActuationCommand {
    pub fn new(scored: &ScoredReading, command_level: Severity) -> Self {
        Self {
            temperature: scored.reading.temperature,
            humidity: scored.reading.humidity,
            command_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading_json(temp: f64, hum: f64) -> String {
        format!(
            r#"{{"temperature":{temp},"humidity":{hum},"timeCreated":"2024-03-01T12:00:00Z"}}"#
        )
    }

    #[test]
    fn reading_decodes_wire_fields() {
        let reading: Reading = serde_json::from_str(&reading_json(21.5, 55.0)).unwrap();
        assert_eq!(reading.temperature, 21.5);
        assert_eq!(reading.humidity, 55.0);
    }

    #[test]
    fn reading_ignores_unknown_fields() {
        let payload = r#"{"temperature":21.5,"humidity":55.0,"timeCreated":"2024-03-01T12:00:00Z","machineId":"m-42"}"#;
        assert!(serde_json::from_str::<Reading>(payload).is_ok());
    }

    #[test]
    fn reading_missing_humidity_is_an_error() {
        let payload = r#"{"temperature":21.5,"timeCreated":"2024-03-01T12:00:00Z"}"#;
        assert!(serde_json::from_str::<Reading>(payload).is_err());
    }

    #[test]
    fn scored_reading_keeps_reading_fields_flat() {
        let reading: Reading = serde_json::from_str(&reading_json(30.0, 50.0)).unwrap();
        let scored = ScoredReading::new(reading, true);
        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(value["temperature"], 30.0);
        assert_eq!(value["isAnomaly"], true);
    }

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }

    #[test]
    fn severity_round_trips_as_ordinal() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "3");
        let level: Severity = serde_json::from_str("2").unwrap();
        assert_eq!(level, Severity::Warning);
        assert!(serde_json::from_str::<Severity>("4").is_err());
    }

    #[test]
    fn actuation_command_serializes_command_level_ordinal() {
        let reading: Reading = serde_json::from_str(&reading_json(42.0, 50.0)).unwrap();
        let command = ActuationCommand::new(&ScoredReading::new(reading, false), Severity::Critical);
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["temperature"], 42.0);
        assert_eq!(value["humidity"], 50.0);
        assert_eq!(value["commandLevel"], 3);
    }
}
