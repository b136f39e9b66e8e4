//! Assessment context: subscores, gravity score and clinical narrative.
//!
//! All functions here are pure and total. Given a validated [`Reading`] they
//! produce the same [`Assessment`] every time.

pub mod composer;
pub mod narrative;
pub mod subscores;

pub use composer::GravityScore;
pub use narrative::{classify, ClinicalNarrative, ConditionTag, NarrativeBranch, NarrativeCategory};
pub use subscores::Subscores;

use serde::{Deserialize, Serialize};

use crate::domain::{AlertTier, Reading};
use crate::validation::ValidationReport;

/// Scores and narrative for one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// The four subscores
    pub subscores: Subscores,
    /// Weighted gravity score
    pub gravity: GravityScore,
    /// Clinical narrative
    pub narrative: ClinicalNarrative,
}

impl Assessment {
    /// Tier the gravity score asks for
    pub fn candidate_tier(&self) -> AlertTier {
        AlertTier::from_score(self.gravity.value())
    }
}

/// Score and classify a reading.
///
/// Both outputs are computed independently; the narrative never looks at the
/// score.
pub fn assess(reading: &Reading) -> Assessment {
    let subscores = Subscores::compute(reading);
    Assessment {
        gravity: GravityScore::compose(&subscores),
        subscores,
        narrative: ClinicalNarrative::of(reading),
    }
}

/// A reading together with its validation report and assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessedReading {
    /// The reading, with the immobility timer's value applied
    pub reading: Reading,
    /// Validation outcome
    pub report: ValidationReport,
    /// Scores and narrative
    pub assessment: Assessment,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_scenario_a() {
        let reading = Reading {
            heart_rate_bpm: 38.0,
            internal_temp_c: 29.5,
            external_temp_c: -18.0,
            movement: false,
            immobile_seconds: 20.0 * 60.0,
            ..Default::default()
        };

        let assessment = assess(&reading);
        assert_eq!(assessment.subscores.as_array(), [1.0, 0.5, 1.0, 0.5]);
        assert_abs_diff_eq!(assessment.gravity.value(), 0.75, epsilon = 1e-12);
        assert_eq!(assessment.candidate_tier(), AlertTier::Serious);
        assert_eq!(assessment.narrative.branch, NarrativeBranch::ModerateHypothermia);
    }

    #[test]
    fn test_scenario_b() {
        let reading = Reading {
            heart_rate_bpm: 58.0,
            internal_temp_c: 35.2,
            external_temp_c: -12.0,
            movement: true,
            ..Default::default()
        };

        let assessment = assess(&reading);
        assert_eq!(assessment.subscores.as_array(), [0.0; 4]);
        assert_eq!(assessment.gravity.value(), 0.0);
        assert_eq!(assessment.candidate_tier(), AlertTier::Normal);
        assert_eq!(assessment.narrative.category, NarrativeCategory::Stable);
    }

    #[test]
    fn test_deterministic() {
        let reading = Reading {
            heart_rate_bpm: 45.0,
            internal_temp_c: 34.0,
            external_temp_c: -12.0,
            movement: false,
            immobile_seconds: 16.0 * 60.0,
            ..Default::default()
        };
        assert_eq!(assess(&reading), assess(&reading));
    }
}
