//! Published wearer status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerting::{AlertState, TimerKind};
use crate::assessment::{AssessedReading, Subscores};
use crate::domain::{AlertEvent, AlertTier};
use crate::validation::Field;

/// Tier and narrative, as shown to the wearer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearerCondition {
    /// Current alert tier
    pub tier: AlertTier,
    /// Clinical narrative label of the latest reading
    pub narrative: String,
}

/// Status record published after every change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WearerStatus {
    /// Gravity score of the latest reading
    #[serde(rename = "ScoreDeGravite")]
    pub score: f64,
    /// Tier and narrative
    #[serde(rename = "EtatDeLalpiniste")]
    pub condition: WearerCondition,
    /// Sample time of the latest reading
    #[serde(rename = "sampleTime")]
    pub sample_time: DateTime<Utc>,
    /// Continuous immobility used for scoring
    #[serde(rename = "immobileMinutes")]
    pub immobile_minutes: f64,
    /// Subscores of the latest reading
    pub subscores: Subscores,
    /// Fields filled from earlier samples
    pub stale: Vec<Field>,
    /// Tier the latest sample asked for while a cooldown held it back
    #[serde(rename = "suppressedTier", default, skip_serializing_if = "Option::is_none")]
    pub suppressed_tier: Option<AlertTier>,
    /// Seconds left on the running countdown
    #[serde(rename = "countdownRemaining", default, skip_serializing_if = "Option::is_none")]
    pub countdown_remaining_secs: Option<i64>,
    /// Seconds left before an acknowledged alert may come back
    #[serde(rename = "cooldownRemaining", default, skip_serializing_if = "Option::is_none")]
    pub cooldown_remaining_secs: Option<i64>,
}

impl WearerStatus {
    /// Build the status from the latest reading and the lifecycle state
    pub fn new(latest: &AssessedReading, state: &AlertState, now: DateTime<Utc>) -> Self {
        Self {
            score: latest.assessment.gravity.value(),
            condition: WearerCondition {
                tier: state.tier(),
                narrative: latest.assessment.narrative.label.clone(),
            },
            sample_time: latest.reading.sample_time(),
            immobile_minutes: latest.reading.immobile_minutes(),
            subscores: latest.assessment.subscores,
            stale: latest.report.stale_fields.clone(),
            suppressed_tier: state.suppressed_tier(),
            countdown_remaining_secs: state.countdown_remaining(now).map(|d| d.num_seconds()),
            cooldown_remaining_secs: state.cooldown_remaining(now).map(|d| d.num_seconds()),
        }
    }

    /// Current tier
    pub fn tier(&self) -> AlertTier {
        self.condition.tier
    }
}

/// What caused an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateTrigger {
    /// A sample was accepted
    Sample,
    /// A countdown elapsed
    Timer(TimerKind),
    /// A Critical alert was reset
    Reset,
}

/// Broadcast after each accepted sample, acted-on timer, or reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorUpdate {
    /// What caused the update
    pub trigger: UpdateTrigger,
    /// Status after the change
    pub status: WearerStatus,
    /// Lifecycle events, in order
    pub events: Vec<AlertEvent>,
}

impl MonitorUpdate {
    /// Whether this update requested an SOS
    pub fn sos_requested(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, AlertEvent::SosRequested { .. }))
    }
}
