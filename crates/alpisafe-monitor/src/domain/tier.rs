//! Alert tiers and their presentation metadata.

use serde::{Deserialize, Serialize};

use crate::config::AlertTimings;

/// Score at or above which a Pre alert is due
pub const PRE_THRESHOLD: f64 = 0.3;
/// Score at or above which a Serious alert is due
pub const SERIOUS_THRESHOLD: f64 = 0.6;
/// Score at or above which a Critical alert is due
pub const CRITICAL_THRESHOLD: f64 = 0.8;

/// Ordered alert tiers: `Normal < Pre < Serious < Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTier {
    /// No active alert
    Normal,
    /// Early warning with a long auto-dismiss countdown
    Pre,
    /// Serious condition, escalates to Critical if the wearer stays immobile
    Serious,
    /// Life-threatening condition, SOS dispatched
    Critical,
}

impl AlertTier {
    /// Candidate tier for a gravity score.
    ///
    /// A NaN score compares false against every threshold and maps to
    /// `Normal`; scores are clamped upstream so this does not occur in the
    /// pipeline.
    pub fn from_score(score: f64) -> Self {
        if score >= CRITICAL_THRESHOLD {
            AlertTier::Critical
        } else if score >= SERIOUS_THRESHOLD {
            AlertTier::Serious
        } else if score >= PRE_THRESHOLD {
            AlertTier::Pre
        } else {
            AlertTier::Normal
        }
    }

    /// Whether an alert is being shown in this tier
    pub fn is_alerting(&self) -> bool {
        !matches!(self, AlertTier::Normal)
    }

    /// Whether an acknowledgment may dismiss this tier
    pub fn is_dismissible(&self) -> bool {
        matches!(self, AlertTier::Pre | AlertTier::Serious)
    }

    /// Whether entering this tier starts a countdown
    pub fn has_countdown(&self) -> bool {
        matches!(self, AlertTier::Pre | AlertTier::Serious)
    }

    /// Get display color
    pub fn color(&self) -> &'static str {
        match self {
            AlertTier::Normal => "green",
            AlertTier::Pre => "yellow",
            AlertTier::Serious => "orange",
            AlertTier::Critical => "red",
        }
    }

    /// Presentation metadata for this tier under the given timings
    pub fn presentation(&self, timings: &AlertTimings) -> TierPresentation {
        let (title, description) = match self {
            AlertTier::Normal => ("Normal", "No alert in progress."),
            AlertTier::Pre => (
                "Pre-alert",
                "Vital signs drifting out of the safe band. Check on the wearer.",
            ),
            AlertTier::Serious => (
                "Serious alert",
                "Serious condition detected. Acknowledge now or an SOS follows if the wearer stays immobile.",
            ),
            AlertTier::Critical => (
                "Critical alert",
                "Life-threatening condition. SOS sent automatically.",
            ),
        };

        let countdown_secs = match self {
            AlertTier::Pre => Some(timings.pre_countdown_secs),
            AlertTier::Serious => Some(timings.serious_countdown_secs),
            AlertTier::Normal | AlertTier::Critical => None,
        };

        TierPresentation {
            title,
            description,
            color: self.color(),
            countdown_secs,
            dismissible: self.is_dismissible(),
            cooldown_secs: if self.is_dismissible() { timings.cooldown_secs } else { 0 },
        }
    }
}

impl std::fmt::Display for AlertTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertTier::Normal => write!(f, "NORMAL"),
            AlertTier::Pre => write!(f, "PRE-ALERT"),
            AlertTier::Serious => write!(f, "SERIOUS"),
            AlertTier::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// How a tier is presented to the wearer and to observers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierPresentation {
    /// Short title
    pub title: &'static str,
    /// One-sentence description
    pub description: &'static str,
    /// Display color
    pub color: &'static str,
    /// Countdown length, for tiers that have one
    pub countdown_secs: Option<u64>,
    /// Whether the acknowledgment control dismisses the alert
    pub dismissible: bool,
    /// Re-activation delay after a dismiss
    pub cooldown_secs: u64,
}
