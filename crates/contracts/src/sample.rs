//! TelemetrySample - Reading Generator output
//!
//! One synthetic temperature/humidity reading plus the message shape that
//! carries it to the ingestion endpoint.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ContractError;

/// Application property flagging readings above the alert threshold
pub const TEMPERATURE_ALERT_PROPERTY: &str = "temperatureAlert";

/// Default alert threshold (degrees Celsius)
pub const DEFAULT_TEMPERATURE_ALERT_THRESHOLD: f64 = 30.0;

/// Round to two decimal places
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One telemetry reading
///
/// Serialized as compact camelCase JSON, e.g.
/// `{"messageId":0,"deviceId":"dev","temperature":27.31,"humidity":71.02}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    pub message_id: u64,
    pub device_id: String,
    pub temperature: f64,
    pub humidity: f64,
}

impl TelemetrySample {
    pub fn new(message_id: u64, device_id: impl Into<String>, temperature: f64, humidity: f64) -> Self {
        Self {
            message_id,
            device_id: device_id.into(),
            temperature: round_to_hundredths(temperature),
            humidity: round_to_hundredths(humidity),
        }
    }

    /// Compact JSON encoding
    pub fn to_json(&self) -> Result<String, ContractError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Whether the reading exceeds the given alert threshold
    pub fn is_temperature_alert(&self, threshold: f64) -> bool {
        self.temperature > threshold
    }
}

/// Serialized telemetry with its application properties
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryMessage {
    /// Message id of the sample this message carries
    pub message_id: u64,
    /// Encoded payload
    pub payload: Bytes,
    /// Application properties (sent as message tags)
    pub properties: BTreeMap<String, String>,
}

impl TelemetryMessage {
    /// Build the message for a sample, tagging it with `temperatureAlert`
    pub fn from_sample(sample: &TelemetrySample, alert_threshold: f64) -> Result<Self, ContractError> {
        let payload = sample.to_json()?;
        let mut properties = BTreeMap::new();
        properties.insert(
            TEMPERATURE_ALERT_PROPERTY.to_string(),
            sample.is_temperature_alert(alert_threshold).to_string(),
        );
        Ok(Self {
            message_id: sample.message_id,
            payload: Bytes::from(payload),
            properties,
        })
    }

    /// Payload as UTF-8 text (for logging)
    pub fn payload_str(&self) -> &str {
        std::str::from_utf8(&self.payload).unwrap_or("<binary>")
    }
}
