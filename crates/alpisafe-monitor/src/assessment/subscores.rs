//! The four subscore calculators.
//!
//! Each calculator is a total function returning a value in `[0, 1]`. Rules
//! are evaluated top to bottom and the first match wins, so the order of the
//! branches is part of the behaviour. A NaN input fails every comparison and
//! falls through to the last branch.

use serde::{Deserialize, Serialize};

use crate::domain::Reading;

/// Cardiac and thermal interaction.
pub fn cardiac_thermal(core_temp_c: f64, heart_rate_bpm: f64) -> f64 {
    let core = core_temp_c;
    let hr = heart_rate_bpm;

    if hr < 40.0 && core < 32.0 {
        1.0
    } else if hr > 120.0 && (32.0..35.0).contains(&core) {
        0.9
    } else if hr > 140.0 || (hr < 50.0 && (32.0..36.0).contains(&core)) {
        0.8
    } else if (100.0..=140.0).contains(&hr) && (35.0..36.0).contains(&core) {
        0.7
    } else if (50.0..100.0).contains(&hr) && (36.0..=38.5).contains(&core) {
        0.5
    } else if hr > 180.0 || core > 40.0 {
        1.0
    } else {
        0.0
    }
}

/// Immobility duration, only while the wearer is not moving.
pub fn immobility(moving: bool, immobile_minutes: f64) -> f64 {
    if moving {
        0.0
    } else if immobile_minutes > 30.0 {
        1.0
    } else if immobile_minutes > 20.0 {
        0.8
    } else if immobile_minutes > 10.0 {
        0.5
    } else {
        0.0
    }
}

/// Exposure to the environment given the core temperature.
///
/// A flat 0.2 is added on top of the matched branch when the ambient air is
/// below -15 C; the sum is capped at 1.
pub fn environmental_thermal(core_temp_c: f64, ambient_temp_c: f64, heart_rate_bpm: f64) -> f64 {
    let core = core_temp_c;
    let ambient = ambient_temp_c;

    let base = if core < 32.0 || core > 40.0 {
        1.0
    } else if (32.0..35.0).contains(&core) && ambient < -10.0 {
        0.9
    } else if (35.0..36.0).contains(&core) && ambient < -15.0 {
        0.8
    } else if (36.0..37.0).contains(&core) && ambient < -10.0 {
        0.7
    } else if (37.0..=38.5).contains(&core) {
        0.5
    } else if core > 39.0 && heart_rate_bpm > 150.0 {
        0.9
    } else {
        0.0
    };

    let wind_chill = if ambient < -15.0 { 0.2 } else { 0.0 };
    f64::min(base + wind_chill, 1.0)
}

/// Combined medical risk of hypothermia, heart rate and immobility.
pub fn medical_interaction(core_temp_c: f64, heart_rate_bpm: f64, immobile_minutes: f64) -> f64 {
    let core = core_temp_c;
    let hr = heart_rate_bpm;
    let minutes = immobile_minutes;

    if core < 32.0 && hr < 40.0 && minutes > 20.0 {
        1.0
    } else if core < 35.0 && hr > 120.0 && minutes > 15.0 {
        0.8
    } else if core < 35.0 || minutes > 15.0 {
        0.5
    } else {
        0.0
    }
}

/// The four subscores of one reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Subscores {
    /// Cardiac-thermal subscore
    pub cardiac_thermal: f64,
    /// Immobility subscore
    pub immobility: f64,
    /// Environmental-thermal subscore
    pub environmental_thermal: f64,
    /// Medical-interaction subscore
    pub medical_interaction: f64,
}

impl Subscores {
    /// Compute all four subscores.
    ///
    /// A moving wearer has no immobile minutes, whatever the counter says.
    pub fn compute(reading: &Reading) -> Self {
        let minutes = effective_immobile_minutes(reading);
        let core = reading.internal_temp_c;
        let hr = reading.heart_rate_bpm;

        Self {
            cardiac_thermal: cardiac_thermal(core, hr),
            immobility: immobility(reading.movement, minutes),
            environmental_thermal: environmental_thermal(core, reading.external_temp_c, hr),
            medical_interaction: medical_interaction(core, hr, minutes),
        }
    }

    /// Subscores as an array, in composer order
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.cardiac_thermal,
            self.immobility,
            self.environmental_thermal,
            self.medical_interaction,
        ]
    }
}

pub(crate) fn effective_immobile_minutes(reading: &Reading) -> f64 {
    if reading.movement {
        0.0
    } else {
        reading.immobile_minutes()
    }
}
