//! Monitor configuration.
//!
//! [`MonitorConfig`] groups every tunable of the decision core: alert
//! countdowns and cooldown, plausibility bounds applied by the validator, and
//! channel capacities for the monitor event loop. Defaults reproduce the
//! device firmware's behaviour (30 s Pre countdown, 10 s Serious countdown,
//! 5 s re-activation cooldown).
//!
//! Configurations load from and save to JSON. Every loaded configuration is
//! validated before use.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors produced while loading or validating a [`MonitorConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field has an invalid value.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// A configuration file could not be read from or written to disk.
    #[error("Cannot access config file `{path}`: {source}")]
    FileRead {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file contains malformed JSON.
    #[error("Cannot parse config file `{path}`: {source}")]
    ParseError {
        /// Path that was being parsed.
        path: PathBuf,
        /// Underlying JSON parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Construct a [`ConfigError::InvalidValue`].
    pub fn invalid_value<S: Into<String>>(field: &'static str, reason: S) -> Self {
        ConfigError::InvalidValue { field, reason: reason.into() }
    }
}

// ---------------------------------------------------------------------------
// AlertTimings
// ---------------------------------------------------------------------------

/// Longest accepted countdown or cooldown, one day
pub const MAX_TIMING_SECS: u64 = 86_400;

/// Countdown and cooldown lengths of the alert lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertTimings {
    /// Pre alert auto-dismiss countdown
    pub pre_countdown_secs: u64,
    /// Serious alert countdown before escalation or auto-dismiss
    pub serious_countdown_secs: u64,
    /// Re-activation cooldown after an acknowledgment dismiss
    pub cooldown_secs: u64,
}

impl Default for AlertTimings {
    fn default() -> Self {
        Self {
            pre_countdown_secs: 30,
            serious_countdown_secs: 10,
            cooldown_secs: 5,
        }
    }
}

impl AlertTimings {
    /// Pre countdown as a duration
    pub fn pre_countdown(&self) -> Duration {
        bounded_seconds(self.pre_countdown_secs)
    }

    /// Serious countdown as a duration
    pub fn serious_countdown(&self) -> Duration {
        bounded_seconds(self.serious_countdown_secs)
    }

    /// Cooldown as a duration
    pub fn cooldown(&self) -> Duration {
        bounded_seconds(self.cooldown_secs)
    }

    fn check(&self) -> Result<(), ConfigError> {
        let timings = [
            ("timings.pre_countdown_secs", self.pre_countdown_secs),
            ("timings.serious_countdown_secs", self.serious_countdown_secs),
            ("timings.cooldown_secs", self.cooldown_secs),
        ];
        for (field, secs) in timings {
            if secs == 0 {
                return Err(ConfigError::invalid_value(field, "must be > 0"));
            }
            if secs > MAX_TIMING_SECS {
                return Err(ConfigError::invalid_value(
                    field,
                    format!("must be <= {MAX_TIMING_SECS}"),
                ));
            }
        }
        Ok(())
    }
}

/// Saturates at [`MAX_TIMING_SECS`] so unvalidated timings never wrap.
fn bounded_seconds(secs: u64) -> Duration {
    let secs = i64::try_from(secs.min(MAX_TIMING_SECS)).unwrap_or(0);
    Duration::seconds(secs)
}

// ---------------------------------------------------------------------------
// ValidationBounds
// ---------------------------------------------------------------------------

/// Inclusive plausibility range for one field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    /// Lowest accepted value
    pub min: f64,
    /// Highest accepted value
    pub max: f64,
}

impl Bound {
    /// Create a bound
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether a value lies inside the bound
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp a value to the nearest bound
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    fn check(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ConfigError::invalid_value(field, "bounds must be finite"));
        }
        if self.min >= self.max {
            return Err(ConfigError::invalid_value(field, "min must be < max"));
        }
        Ok(())
    }
}

/// Plausibility bounds applied by the reading validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationBounds {
    /// Heart rate, bpm
    pub heart_rate_bpm: Bound,
    /// Core temperature, Celsius
    pub internal_temp_c: Bound,
    /// Ambient temperature, Celsius
    pub external_temp_c: Bound,
    /// Altitude, metres
    pub altitude_m: Bound,
    /// Relative humidity, percent
    pub humidity_pct: Bound,
    /// Latitude, degrees
    pub latitude_deg: Bound,
    /// Longitude, degrees
    pub longitude_deg: Bound,
    /// Ground speed, km/h
    pub speed_kmh: Bound,
    /// Device immobility counter, seconds
    pub immobile_seconds: Bound,
}

impl Default for ValidationBounds {
    fn default() -> Self {
        Self {
            heart_rate_bpm: Bound::new(1.0, 300.0),
            internal_temp_c: Bound::new(10.0, 45.0),
            external_temp_c: Bound::new(-70.0, 60.0),
            altitude_m: Bound::new(0.0, 9000.0),
            humidity_pct: Bound::new(0.0, 100.0),
            latitude_deg: Bound::new(-90.0, 90.0),
            longitude_deg: Bound::new(-180.0, 180.0),
            speed_kmh: Bound::new(0.0, 300.0),
            // One week
            immobile_seconds: Bound::new(0.0, 604_800.0),
        }
    }
}

impl ValidationBounds {
    /// Validate every bound
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.heart_rate_bpm.check("bounds.heart_rate_bpm")?;
        self.internal_temp_c.check("bounds.internal_temp_c")?;
        self.external_temp_c.check("bounds.external_temp_c")?;
        self.altitude_m.check("bounds.altitude_m")?;
        self.humidity_pct.check("bounds.humidity_pct")?;
        self.latitude_deg.check("bounds.latitude_deg")?;
        self.longitude_deg.check("bounds.longitude_deg")?;
        self.speed_kmh.check("bounds.speed_kmh")?;
        self.immobile_seconds.check("bounds.immobile_seconds")?;

        if self.heart_rate_bpm.min <= 0.0 {
            return Err(ConfigError::invalid_value(
                "bounds.heart_rate_bpm",
                "min must be > 0",
            ));
        }
        if self.immobile_seconds.min < 0.0 {
            return Err(ConfigError::invalid_value(
                "bounds.immobile_seconds",
                "min must be >= 0",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MonitorConfig
// ---------------------------------------------------------------------------

/// Complete configuration of a monitor instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Alert countdowns and cooldown
    pub timings: AlertTimings,
    /// Validator plausibility bounds
    pub bounds: ValidationBounds,
    /// Capacity of the monitor's inbound event queue
    pub queue_capacity: usize,
    /// Capacity of the update broadcast channel
    pub broadcast_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            timings: AlertTimings::default(),
            bounds: ValidationBounds::default(),
            queue_capacity: 256,
            broadcast_capacity: 64,
        }
    }
}

impl MonitorConfig {
    /// Create a new builder
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileRead`] if the file cannot be opened,
    /// [`ConfigError::ParseError`] if the JSON is malformed and
    /// [`ConfigError::InvalidValue`] if validation fails.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: MonitorConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::ParseError {
                path: path.to_path_buf(),
                source,
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize this configuration to pretty-printed JSON and write it to
    /// `path`, creating parent directories if necessary.
    pub fn to_json(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::FileRead {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = self.to_json_string()?;
        std::fs::write(path, json).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Pretty-printed JSON form of this configuration
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::invalid_value("(serialization)", e.to_string()))
    }

    /// Validate all fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timings.check()?;

        self.bounds.validate()?;

        // Channels
        if self.queue_capacity == 0 {
            return Err(ConfigError::invalid_value("queue_capacity", "must be > 0"));
        }
        if self.broadcast_capacity == 0 {
            return Err(ConfigError::invalid_value(
                "broadcast_capacity",
                "must be > 0",
            ));
        }
        Ok(())
    }
}

/// Builder for MonitorConfig
#[derive(Debug, Default)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    /// Set Pre countdown
    pub fn pre_countdown_secs(mut self, secs: u64) -> Self {
        self.config.timings.pre_countdown_secs = secs.clamp(1, MAX_TIMING_SECS);
        self
    }

    /// Set Serious countdown
    pub fn serious_countdown_secs(mut self, secs: u64) -> Self {
        self.config.timings.serious_countdown_secs = secs.clamp(1, MAX_TIMING_SECS);
        self
    }

    /// Set re-activation cooldown
    pub fn cooldown_secs(mut self, secs: u64) -> Self {
        self.config.timings.cooldown_secs = secs.clamp(1, MAX_TIMING_SECS);
        self
    }

    /// Set validator bounds
    pub fn bounds(mut self, bounds: ValidationBounds) -> Self {
        self.config.bounds = bounds;
        self
    }

    /// Set inbound queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity.max(1);
        self
    }

    /// Set broadcast capacity
    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.config.broadcast_capacity = capacity.max(1);
        self
    }

    /// Build the configuration
    pub fn build(self) -> MonitorConfig {
        self.config
    }
}
