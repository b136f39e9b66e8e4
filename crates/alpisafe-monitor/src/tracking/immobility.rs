//! Immobility timer.
//!
//! Tracks how long the wearer has been continuously still:
//! Moving → 0, Still → device counter if fresh, else accumulated sample gaps.

use serde::{Deserialize, Serialize};

/// Where the current immobility value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImmobilitySource {
    /// The wearer is moving; the timer is at zero
    Moving,
    /// The device's own counter, reported in this sample
    Device,
    /// Accumulated from the gaps between sample timestamps
    Accumulated,
    /// Timestamp did not advance; value unchanged
    Held,
}

/// Result of feeding one sample to the timer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImmobilityUpdate {
    /// Continuous immobility, seconds
    pub seconds: f64,
    /// Origin of the value
    pub source: ImmobilitySource,
}

impl ImmobilityUpdate {
    /// Immobility in minutes
    pub fn minutes(&self) -> f64 {
        self.seconds / 60.0
    }
}

/// Continuous no-movement duration, the single source of immobility minutes
/// for scoring, narrative and escalation.
#[derive(Debug, Clone, Default)]
pub struct ImmobilityTimer {
    immobile_seconds: f64,
    last_sample_time: Option<i64>,
}

impl ImmobilityTimer {
    /// Create a timer at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one validated sample.
    ///
    /// `device_seconds` is the device counter when this sample supplied it.
    /// A duplicate or backward timestamp never advances the timer.
    pub fn observe(
        &mut self,
        sample_time_unix: i64,
        moving: bool,
        device_seconds: Option<f64>,
    ) -> ImmobilityUpdate {
        let delta = match self.last_sample_time {
            Some(previous) if sample_time_unix > previous => Some((sample_time_unix - previous) as f64),
            Some(_) => None,
            None => Some(0.0),
        };

        let source = if moving {
            self.immobile_seconds = 0.0;
            ImmobilitySource::Moving
        } else {
            match (delta, device_seconds) {
                (None, _) => ImmobilitySource::Held,
                (Some(_), Some(device)) => {
                    self.immobile_seconds = device.max(0.0);
                    ImmobilitySource::Device
                }
                (Some(delta), None) => {
                    self.immobile_seconds += delta;
                    ImmobilitySource::Accumulated
                }
            }
        };

        if delta.is_some() {
            self.last_sample_time = Some(sample_time_unix);
        }

        ImmobilityUpdate {
            seconds: self.immobile_seconds,
            source,
        }
    }

    /// Continuous immobility, seconds
    pub fn immobile_seconds(&self) -> f64 {
        self.immobile_seconds
    }

    /// Continuous immobility, minutes
    pub fn immobile_minutes(&self) -> f64 {
        self.immobile_seconds / 60.0
    }

    /// Return to zero and forget the last sample time
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
