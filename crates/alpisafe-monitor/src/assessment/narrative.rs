//! Clinical narrative classification.
//!
//! An ordered cascade over core temperature, heart rate, ambient temperature
//! and immobility. The first matching branch decides the narrative; only when
//! no critical branch matches are independent condition tags accumulated.
//! The cascade never consults the gravity score.

use serde::{Deserialize, Serialize};

use crate::domain::Reading;

/// Severity class of a narrative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NarrativeCategory {
    /// A life-threatening condition
    Critical,
    /// One or more concerning conditions
    Warning,
    /// Vitals in the normal band
    Stable,
    /// Nothing matched and vitals are outside the normal band
    Indeterminate,
}

impl std::fmt::Display for NarrativeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NarrativeCategory::Critical => write!(f, "Critical"),
            NarrativeCategory::Warning => write!(f, "Warning"),
            NarrativeCategory::Stable => write!(f, "Stable"),
            NarrativeCategory::Indeterminate => write!(f, "Indeterminate"),
        }
    }
}

/// Branch of the cascade that produced a narrative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NarrativeBranch {
    /// Core <= 24 C
    LifeThreateningHypothermia,
    /// Core >= 41.5 C
    MalignantHyperthermia,
    /// Core <= 28 C
    SevereHypothermia,
    /// Core <= 32 C
    ModerateHypothermia,
    /// Ambient < -25 C with a cold core or prolonged immobility
    ExtremeColdExposure,
    /// Long immobility with a cold core, bradycardia or severe cold
    CriticalImmobility,
    /// Heart rate > 220 bpm
    CriticalTachycardia,
    /// Heart rate < 35 bpm
    CriticalBradycardia,
    /// One or more non-critical condition tags
    Combined,
    /// Vitals in the normal band
    Stable,
    /// No rule matched
    Indeterminate,
}

impl NarrativeBranch {
    /// Category of the branch
    pub fn category(&self) -> NarrativeCategory {
        match self {
            NarrativeBranch::Combined => NarrativeCategory::Warning,
            NarrativeBranch::Stable => NarrativeCategory::Stable,
            NarrativeBranch::Indeterminate => NarrativeCategory::Indeterminate,
            _ => NarrativeCategory::Critical,
        }
    }
}

/// Non-critical conditions that can co-occur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionTag {
    /// 32 < core <= 35
    MildHypothermia,
    /// 38.5 < core < 40
    ModerateHyperthermia,
    /// 40 <= core < 41.5
    SevereHyperthermia,
    /// 35 <= hr < 50
    SignificantBradycardia,
    /// 150 < hr <= 180
    SevereTachycardia,
    /// 180 < hr <= 220
    VerySevereTachycardia,
    /// Not moving, 15 < minutes <= 30
    ConcerningImmobility,
    /// Not moving, minutes > 30
    ProlongedImmobility,
}

impl ConditionTag {
    /// Label fragment
    pub fn label(&self) -> &'static str {
        match self {
            ConditionTag::MildHypothermia => "mild hypothermia",
            ConditionTag::ModerateHyperthermia => "moderate hyperthermia",
            ConditionTag::SevereHyperthermia => "severe hyperthermia",
            ConditionTag::SignificantBradycardia => "significant bradycardia",
            ConditionTag::SevereTachycardia => "severe tachycardia",
            ConditionTag::VerySevereTachycardia => "very severe tachycardia",
            ConditionTag::ConcerningImmobility => "concerning immobility",
            ConditionTag::ProlongedImmobility => "prolonged immobility",
        }
    }
}

/// Result of the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalNarrative {
    /// Severity class
    pub category: NarrativeCategory,
    /// Matched branch
    pub branch: NarrativeBranch,
    /// Accumulated tags (only for [`NarrativeBranch::Combined`])
    pub tags: Vec<ConditionTag>,
    /// Human-readable label
    pub label: String,
}

impl ClinicalNarrative {
    fn fixed(branch: NarrativeBranch, label: &str) -> Self {
        Self {
            category: branch.category(),
            branch,
            tags: Vec::new(),
            label: label.to_string(),
        }
    }

    /// Classify a validated reading
    pub fn of(reading: &Reading) -> Self {
        classify(
            reading.internal_temp_c,
            reading.heart_rate_bpm,
            reading.external_temp_c,
            reading.immobile_minutes(),
            reading.movement,
        )
    }

    /// Whether the narrative describes a life-threatening condition
    pub fn is_critical(&self) -> bool {
        self.category == NarrativeCategory::Critical
    }
}

impl std::fmt::Display for ClinicalNarrative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

/// Run the classification cascade.
///
/// `immobile_minutes` only counts while the wearer is not moving.
pub fn classify(
    core_temp_c: f64,
    heart_rate_bpm: f64,
    ambient_temp_c: f64,
    immobile_minutes: f64,
    moving: bool,
) -> ClinicalNarrative {
    use NarrativeBranch::*;

    let core = core_temp_c;
    let hr = heart_rate_bpm;
    let ambient = ambient_temp_c;
    let minutes = if moving { 0.0 } else { immobile_minutes };

    if core <= 24.0 {
        let label = if hr < 40.0 {
            "Life-threatening hypothermia with bradycardia: cardiac arrest imminent"
        } else if hr > 100.0 {
            "Life-threatening hypothermia with paradoxical tachycardia: high arrhythmia risk"
        } else {
            "Life-threatening hypothermia"
        };
        return ClinicalNarrative::fixed(LifeThreateningHypothermia, label);
    }

    if core >= 41.5 {
        let label = if hr > 180.0 {
            "Malignant hyperthermia with extreme tachycardia"
        } else if !moving {
            "Malignant hyperthermia with immobility: possible loss of consciousness"
        } else {
            "Malignant hyperthermia"
        };
        return ClinicalNarrative::fixed(MalignantHyperthermia, label);
    }

    if core <= 28.0 {
        let label = if hr < 40.0 {
            "Severe hypothermia with bradycardia"
        } else if hr > 150.0 {
            "Severe hypothermia with tachycardia: arrhythmia risk"
        } else if minutes > 30.0 {
            "Severe hypothermia with prolonged immobility"
        } else {
            "Severe hypothermia"
        };
        return ClinicalNarrative::fixed(SevereHypothermia, label);
    }

    if core <= 32.0 {
        let label = if hr < 50.0 {
            "Moderate hypothermia with bradycardia"
        } else if hr > 120.0 {
            "Moderate hypothermia with tachycardia"
        } else if minutes > 20.0 {
            "Moderate hypothermia with immobility"
        } else {
            "Moderate hypothermia"
        };
        return ClinicalNarrative::fixed(ModerateHypothermia, label);
    }

    if ambient < -25.0 && (core <= 35.0 || minutes > 15.0) {
        return ClinicalNarrative::fixed(
            ExtremeColdExposure,
            "Extreme cold exposure: frostbite and hypothermia risk",
        );
    }

    if (minutes > 40.0 && (core <= 35.0 || hr < 50.0)) || (minutes > 30.0 && ambient < -20.0) {
        return ClinicalNarrative::fixed(
            CriticalImmobility,
            "Critical immobility: possible unconsciousness or injury",
        );
    }

    if hr > 220.0 {
        let label = if core >= 39.0 {
            "Critical tachycardia with hyperthermia"
        } else {
            "Critical tachycardia"
        };
        return ClinicalNarrative::fixed(CriticalTachycardia, label);
    }

    if hr < 35.0 {
        return ClinicalNarrative::fixed(CriticalBradycardia, "Critical bradycardia");
    }

    let tags = condition_tags(core, hr, minutes, moving);
    if !tags.is_empty() {
        let joined = tags.iter().map(ConditionTag::label).collect::<Vec<_>>().join(" and ");
        return ClinicalNarrative {
            category: Combined.category(),
            branch: Combined,
            tags,
            label: capitalize(&joined),
        };
    }

    let in_normal_band = core > 35.0
        && core < 38.5
        && (50.0..=150.0).contains(&hr)
        && (moving || minutes <= 15.0);

    if in_normal_band {
        ClinicalNarrative::fixed(Stable, "Stable condition")
    } else {
        ClinicalNarrative::fixed(Indeterminate, "Indeterminate condition: monitoring continues")
    }
}

fn condition_tags(core: f64, hr: f64, minutes: f64, moving: bool) -> Vec<ConditionTag> {
    let mut tags = Vec::new();

    if core > 32.0 && core <= 35.0 {
        tags.push(ConditionTag::MildHypothermia);
    }
    if core > 38.5 && core < 40.0 {
        tags.push(ConditionTag::ModerateHyperthermia);
    }
    if (40.0..41.5).contains(&core) {
        tags.push(ConditionTag::SevereHyperthermia);
    }
    if (35.0..50.0).contains(&hr) {
        tags.push(ConditionTag::SignificantBradycardia);
    }
    if hr > 150.0 && hr <= 180.0 {
        tags.push(ConditionTag::SevereTachycardia);
    }
    if hr > 180.0 && hr <= 220.0 {
        tags.push(ConditionTag::VerySevereTachycardia);
    }
    if !moving && minutes > 15.0 && minutes <= 30.0 {
        tags.push(ConditionTag::ConcerningImmobility);
    }
    if !moving && minutes > 30.0 {
        tags.push(ConditionTag::ProlongedImmobility);
    }

    tags
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
