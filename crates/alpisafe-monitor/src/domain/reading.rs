//! Validated telemetry reading.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One validated sample of wearer telemetry.
///
/// Produced by [`crate::validation::ReadingValidator`]; every field is finite
/// and within the configured plausibility bounds. `immobile_seconds` is
/// overwritten by the immobility timer before scoring so that every consumer
/// sees the same value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Heart rate in beats per minute (> 0)
    pub heart_rate_bpm: f64,
    /// Core (internal) temperature in Celsius
    pub internal_temp_c: f64,
    /// Ambient (external) temperature in Celsius
    pub external_temp_c: f64,
    /// Whether the wearer is moving
    pub movement: bool,
    /// Continuous time without movement, in seconds
    pub immobile_seconds: f64,
    /// Altitude in metres
    pub altitude_m: f64,
    /// Relative humidity in percent
    pub humidity_pct: f64,
    /// GPS latitude in degrees
    pub latitude_deg: f64,
    /// GPS longitude in degrees
    pub longitude_deg: f64,
    /// Ground speed in km/h
    pub speed_kmh: f64,
    /// Sample time, unix seconds
    pub sample_time_unix: i64,
    /// Raw level of the acknowledgment button
    pub button_pressed: bool,
}

impl Reading {
    /// Immobility expressed in minutes
    pub fn immobile_minutes(&self) -> f64 {
        self.immobile_seconds / 60.0
    }

    /// Sample time as a UTC timestamp
    pub fn sample_time(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.sample_time_unix, 0)
            .single()
            .unwrap_or_default()
    }

    /// Whether the reading carries a usable GPS fix
    pub fn has_fix(&self) -> bool {
        self.latitude_deg != 0.0 || self.longitude_deg != 0.0
    }
}

impl Default for Reading {
    /// A resting wearer in mild conditions
    fn default() -> Self {
        Self {
            heart_rate_bpm: 72.0,
            internal_temp_c: 37.0,
            external_temp_c: 10.0,
            movement: true,
            immobile_seconds: 0.0,
            altitude_m: 0.0,
            humidity_pct: 50.0,
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            speed_kmh: 0.0,
            sample_time_unix: 0,
            button_pressed: false,
        }
    }
}
