//! Validation context: turns raw device samples into readings.
//!
//! The device publishes every field as a string. [`ReadingValidator`] parses
//! them, clamps implausible values to the configured bounds and keeps the last
//! known-good value of every field so that a partially broken sample can
//! still be scored. Problems are reported as [`ValidationIssue`]s; only a
//! required field with no usable value at all rejects the sample.

mod acknowledge;

pub use acknowledge::AcknowledgeEdge;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::config::{Bound, ValidationBounds};
use crate::domain::{RawSample, Reading};

/// Fields of the device contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// `BPM`
    HeartRate,
    /// `InternalTemperature`
    InternalTemperature,
    /// `ExternalTemperature`
    ExternalTemperature,
    /// `altitude`
    Altitude,
    /// `humidity`
    Humidity,
    /// `latitudeDegrees`
    Latitude,
    /// `longitudeDegrees`
    Longitude,
    /// `movement`
    Movement,
    /// `speed`
    Speed,
    /// `timestamp`
    Timestamp,
    /// `ButtonState`
    Button,
    /// `tempsDimmobilite`
    ImmobileSeconds,
}

impl Field {
    /// Every field, in contract order
    pub const ALL: [Field; 12] = [
        Field::HeartRate,
        Field::InternalTemperature,
        Field::ExternalTemperature,
        Field::Altitude,
        Field::Humidity,
        Field::Latitude,
        Field::Longitude,
        Field::Movement,
        Field::Speed,
        Field::Timestamp,
        Field::Button,
        Field::ImmobileSeconds,
    ];

    /// Name of the field on the wire
    pub fn wire_name(&self) -> &'static str {
        match self {
            Field::HeartRate => "BPM",
            Field::InternalTemperature => "InternalTemperature",
            Field::ExternalTemperature => "ExternalTemperature",
            Field::Altitude => "altitude",
            Field::Humidity => "humidity",
            Field::Latitude => "latitudeDegrees",
            Field::Longitude => "longitudeDegrees",
            Field::Movement => "movement",
            Field::Speed => "speed",
            Field::Timestamp => "timestamp",
            Field::Button => "ButtonState",
            Field::ImmobileSeconds => "tempsDimmobilite",
        }
    }

    /// Whether a sample must be rejected when this field has never been good
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            Field::HeartRate
                | Field::InternalTemperature
                | Field::ExternalTemperature
                | Field::Movement
                | Field::Timestamp
        )
    }

    fn is_flag(&self) -> bool {
        matches!(self, Field::Movement | Field::Button)
    }

    fn raw<'a>(&self, sample: &'a RawSample) -> Option<&'a str> {
        let value = match self {
            Field::HeartRate => &sample.bpm,
            Field::InternalTemperature => &sample.internal_temperature,
            Field::ExternalTemperature => &sample.external_temperature,
            Field::Altitude => &sample.altitude,
            Field::Humidity => &sample.humidity,
            Field::Latitude => &sample.latitude_degrees,
            Field::Longitude => &sample.longitude_degrees,
            Field::Movement => &sample.movement,
            Field::Speed => &sample.speed,
            Field::Timestamp => &sample.timestamp,
            Field::Button => &sample.button_state,
            Field::ImmobileSeconds => &sample.temps_dimmobilite,
        };
        value.as_deref()
    }

    fn bound<'a>(&self, bounds: &'a ValidationBounds) -> Option<&'a Bound> {
        match self {
            Field::HeartRate => Some(&bounds.heart_rate_bpm),
            Field::InternalTemperature => Some(&bounds.internal_temp_c),
            Field::ExternalTemperature => Some(&bounds.external_temp_c),
            Field::Altitude => Some(&bounds.altitude_m),
            Field::Humidity => Some(&bounds.humidity_pct),
            Field::Latitude => Some(&bounds.latitude_deg),
            Field::Longitude => Some(&bounds.longitude_deg),
            Field::Speed => Some(&bounds.speed_kmh),
            Field::ImmobileSeconds => Some(&bounds.immobile_seconds),
            Field::Movement | Field::Button | Field::Timestamp => None,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

// ---------------------------------------------------------------------------
// Errors and issues
// ---------------------------------------------------------------------------

/// A field could not be read
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// Field absent from the sample
    #[error("field `{field}` is missing")]
    Missing {
        /// The field
        field: Field,
    },

    /// Field present but not a number (or flag)
    #[error("field `{field}` has unparseable value {value:?}")]
    Malformed {
        /// The field
        field: Field,
        /// Raw text
        value: String,
    },

    /// A required field is unusable and no earlier value exists
    #[error("required field `{field}` has no known-good value")]
    NoKnownGood {
        /// The field
        field: Field,
    },
}

/// Non-fatal problem found while validating a sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationIssue {
    /// Missing or malformed field; the previous value was retained
    Invalid(ValidationError),
    /// Value outside its plausibility bound; clamped
    OutOfRange {
        /// The field
        field: Field,
        /// Parsed value
        value: f64,
        /// Value used instead
        clamped_to: f64,
    },
    /// Timestamp not strictly after the previous sample
    TimingRegression {
        /// Previous sample time
        previous: i64,
        /// This sample's time
        current: i64,
    },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::Invalid(e) => write!(f, "{e}"),
            ValidationIssue::OutOfRange { field, value, clamped_to } => {
                write!(f, "field `{field}` value {value} out of range, clamped to {clamped_to}")
            }
            ValidationIssue::TimingRegression { previous, current } => {
                write!(f, "timestamp {current} not after previous {previous}")
            }
        }
    }
}

/// Outcome of validating one sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Problems found, in field order
    pub issues: Vec<ValidationIssue>,
    /// Fields whose value was carried over from an earlier sample
    pub stale_fields: Vec<Field>,
}

impl ValidationReport {
    /// Whether any field was carried over
    pub fn is_stale(&self) -> bool {
        !self.stale_fields.is_empty()
    }

    /// Whether this sample supplied the field itself
    pub fn is_fresh(&self, field: Field) -> bool {
        !self.stale_fields.contains(&field)
    }

    /// Whether the sample is free of issues
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Whether the timestamp regressed
    pub fn has_timing_regression(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| matches!(issue, ValidationIssue::TimingRegression { .. }))
    }
}

/// A reading and the report that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSample {
    /// Parsed reading
    pub reading: Reading,
    /// Validation report
    pub report: ValidationReport,
}

impl ValidatedSample {
    /// Device-reported immobility, only when this sample supplied it
    pub fn fresh_immobile_seconds(&self) -> Option<f64> {
        self.report
            .is_fresh(Field::ImmobileSeconds)
            .then_some(self.reading.immobile_seconds)
    }
}

// ---------------------------------------------------------------------------
// ReadingValidator
// ---------------------------------------------------------------------------

/// Stateful validator keeping the last known-good value per field
#[derive(Debug, Clone)]
pub struct ReadingValidator {
    bounds: ValidationBounds,
    last_good: HashMap<Field, f64>,
    last_timestamp: Option<i64>,
}

impl ReadingValidator {
    /// Create a validator with the given bounds
    pub fn new(bounds: ValidationBounds) -> Self {
        Self {
            bounds,
            last_good: HashMap::new(),
            last_timestamp: None,
        }
    }

    /// Validate a sample.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoKnownGood`] when a required field is
    /// missing or malformed and no earlier sample supplied it.
    pub fn validate(&mut self, sample: &RawSample) -> Result<ValidatedSample, ValidationError> {
        let mut report = ValidationReport::default();
        let mut values = HashMap::with_capacity(Field::ALL.len());

        // Resolve every field before committing anything, so a rejected
        // sample leaves the known-good table untouched.
        let mut fresh = Vec::new();
        for field in Field::ALL {
            match self.parse(field, sample) {
                Ok(value) => {
                    let value = self.clamp(field, value, &mut report);
                    fresh.push((field, value));
                    values.insert(field, value);
                }
                Err(error) => {
                    let fallback = match self.last_good.get(&field) {
                        // The device counter is never carried over; the
                        // immobility timer accumulates instead.
                        Some(_) if field == Field::ImmobileSeconds => 0.0,
                        Some(&previous) => previous,
                        None if field.is_required() => {
                            tracing::warn!(field = %field, error = %error, "Rejecting sample");
                            return Err(ValidationError::NoKnownGood { field });
                        }
                        None => 0.0,
                    };
                    report.issues.push(ValidationIssue::Invalid(error));
                    report.stale_fields.push(field);
                    values.insert(field, fallback);
                }
            }
        }

        for (field, value) in fresh {
            self.last_good.insert(field, value);
        }

        let get = |field: Field| values.get(&field).copied().unwrap_or_default();
        let sample_time_unix = get(Field::Timestamp) as i64;

        if let Some(previous) = self.last_timestamp {
            if sample_time_unix <= previous && report.is_fresh(Field::Timestamp) {
                report.issues.push(ValidationIssue::TimingRegression {
                    previous,
                    current: sample_time_unix,
                });
            }
        }
        self.last_timestamp = Some(match self.last_timestamp {
            Some(previous) => previous.max(sample_time_unix),
            None => sample_time_unix,
        });

        let reading = Reading {
            heart_rate_bpm: get(Field::HeartRate),
            internal_temp_c: get(Field::InternalTemperature),
            external_temp_c: get(Field::ExternalTemperature),
            movement: get(Field::Movement) != 0.0,
            immobile_seconds: get(Field::ImmobileSeconds),
            altitude_m: get(Field::Altitude),
            humidity_pct: get(Field::Humidity),
            latitude_deg: get(Field::Latitude),
            longitude_deg: get(Field::Longitude),
            speed_kmh: get(Field::Speed),
            sample_time_unix,
            button_pressed: get(Field::Button) != 0.0,
        };

        if !report.is_clean() {
            tracing::debug!(
                issues = report.issues.len(),
                stale = report.stale_fields.len(),
                "Sample validated with issues"
            );
        }

        Ok(ValidatedSample { reading, report })
    }

    /// Forget all known-good values
    pub fn reset(&mut self) {
        self.last_good.clear();
        self.last_timestamp = None;
    }

    /// Bounds in use
    pub fn bounds(&self) -> &ValidationBounds {
        &self.bounds
    }

    fn parse(&self, field: Field, sample: &RawSample) -> Result<f64, ValidationError> {
        let raw = field.raw(sample).ok_or(ValidationError::Missing { field })?;
        let text = raw.trim();
        let malformed = || ValidationError::Malformed {
            field,
            value: raw.to_string(),
        };

        if field.is_flag() {
            return match text {
                "1" | "true" => Ok(1.0),
                "0" | "false" => Ok(0.0),
                _ => Err(malformed()),
            };
        }

        let value: f64 = text.parse().map_err(|_| malformed())?;
        if !value.is_finite() {
            return Err(malformed());
        }
        if field == Field::Timestamp {
            return Ok(value.floor());
        }
        Ok(value)
    }

    fn clamp(&self, field: Field, value: f64, report: &mut ValidationReport) -> f64 {
        let Some(bound) = field.bound(&self.bounds) else {
            return value;
        };
        if bound.contains(value) {
            return value;
        }

        let clamped_to = bound.clamp(value);
        tracing::warn!(field = %field, value, clamped_to, "Value out of range");
        report.issues.push(ValidationIssue::OutOfRange {
            field,
            value,
            clamped_to,
        });
        clamped_to
    }
}

impl Default for ReadingValidator {
    fn default() -> Self {
        Self::new(ValidationBounds::default())
    }
}
