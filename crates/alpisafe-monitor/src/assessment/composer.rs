//! Gravity score composition.

use serde::{Deserialize, Serialize};

use super::Subscores;

/// Cardiac-thermal weight, in thousandths
pub const CARDIAC_THERMAL_WEIGHT_MILLI: u32 = 300;
/// Immobility weight, in thousandths
pub const IMMOBILITY_WEIGHT_MILLI: u32 = 300;
/// Environmental-thermal weight, in thousandths
pub const ENVIRONMENTAL_THERMAL_WEIGHT_MILLI: u32 = 200;
/// Medical-interaction weight, in thousandths
pub const MEDICAL_INTERACTION_WEIGHT_MILLI: u32 = 200;

const WEIGHT_SCALE: u32 = 1000;

const WEIGHTS_MILLI: [u32; 4] = [
    CARDIAC_THERMAL_WEIGHT_MILLI,
    IMMOBILITY_WEIGHT_MILLI,
    ENVIRONMENTAL_THERMAL_WEIGHT_MILLI,
    MEDICAL_INTERACTION_WEIGHT_MILLI,
];

const _: () = assert!(
    CARDIAC_THERMAL_WEIGHT_MILLI
        + IMMOBILITY_WEIGHT_MILLI
        + ENVIRONMENTAL_THERMAL_WEIGHT_MILLI
        + MEDICAL_INTERACTION_WEIGHT_MILLI
        == WEIGHT_SCALE,
    "composer weights must sum to 1"
);

/// Composer weights as fractions, in subscore order
pub fn weights() -> [f64; 4] {
    WEIGHTS_MILLI.map(|w| f64::from(w) / f64::from(WEIGHT_SCALE))
}

/// Severity of the wearer's situation, in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GravityScore(f64);

impl GravityScore {
    /// Wrap a value, clamping it to `[0, 1]`. NaN maps to 0.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Weighted sum of the four subscores
    pub fn compose(subscores: &Subscores) -> Self {
        let weighted: f64 = subscores
            .as_array()
            .iter()
            .zip(WEIGHTS_MILLI)
            .map(|(value, weight)| value * f64::from(weight))
            .sum();

        Self::new(weighted / f64::from(WEIGHT_SCALE))
    }

    /// Get the raw value
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for GravityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
