//! Raw device sample as received at the system boundary.

use serde::{Deserialize, Deserializer, Serialize};

/// A telemetry record exactly as the device publishes it.
///
/// Every field is an optional string. Devices and replay files occasionally
/// write bare JSON numbers or booleans instead; those are accepted and kept in
/// their textual form so the validator sees a single representation.
/// Unknown fields (`GPSdate`, `GPStime`, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSample {
    /// Heart rate. `heartRate` is accepted as an alias.
    #[serde(rename = "BPM", alias = "heartRate", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub bpm: Option<String>,
    /// Core temperature, Celsius
    #[serde(rename = "InternalTemperature", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub internal_temperature: Option<String>,
    /// Ambient temperature, Celsius
    #[serde(rename = "ExternalTemperature", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub external_temperature: Option<String>,
    /// Altitude, metres
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub altitude: Option<String>,
    /// Relative humidity, percent
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub humidity: Option<String>,
    /// GPS latitude, degrees
    #[serde(rename = "latitudeDegrees", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub latitude_degrees: Option<String>,
    /// GPS longitude, degrees
    #[serde(rename = "longitudeDegrees", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub longitude_degrees: Option<String>,
    /// Motion flag, `"0"` or `"1"`
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub movement: Option<String>,
    /// Ground speed, km/h
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    /// Sample time, unix seconds
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Acknowledgment button level, `"0"` or `"1"`
    #[serde(rename = "ButtonState", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub button_state: Option<String>,
    /// Device-side immobility counter, seconds
    #[serde(rename = "tempsDimmobilite", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub temps_dimmobilite: Option<String>,
}

impl RawSample {
    /// Create an empty sample
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field by its wire name. Unknown names are ignored.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match name {
            "BPM" | "heartRate" => self.bpm = value,
            "InternalTemperature" => self.internal_temperature = value,
            "ExternalTemperature" => self.external_temperature = value,
            "altitude" => self.altitude = value,
            "humidity" => self.humidity = value,
            "latitudeDegrees" => self.latitude_degrees = value,
            "longitudeDegrees" => self.longitude_degrees = value,
            "movement" => self.movement = value,
            "speed" => self.speed = value,
            "timestamp" => self.timestamp = value,
            "ButtonState" => self.button_state = value,
            "tempsDimmobilite" => self.temps_dimmobilite = value,
            other => tracing::debug!(field = other, "Ignoring unknown sample field"),
        }
        self
    }
}

fn lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(if b { "1" } else { "0" }.to_string()),
        Some(other) => Some(other.to_string()),
    })
}
