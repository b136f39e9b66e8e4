//! Domain events emitted by the alert lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AlertTier;

/// Why a tier was entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryCause {
    /// The gravity score reached the tier's threshold
    Score,
    /// A Serious countdown elapsed with the wearer still immobile
    Escalation,
}

/// Alert lifecycle events, in the order the state machine produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlertEvent {
    /// A higher tier was entered
    TierEntered {
        tier: AlertTier,
        previous: AlertTier,
        cause: EntryCause,
        gravity_score: f64,
        deadline: Option<DateTime<Utc>>,
        generation: u64,
        timestamp: DateTime<Utc>,
    },

    /// The wearer acknowledged and dismissed a Pre or Serious alert
    Dismissed {
        tier: AlertTier,
        cooldown_until: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// A countdown elapsed and the alert returned to Normal
    Expired {
        tier: AlertTier,
        timestamp: DateTime<Utc>,
    },

    /// An activation was computed but held back by the cooldown
    ActivationSuppressed {
        candidate: AlertTier,
        cooldown_until: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// Movement resumed during a Serious countdown
    EscalationDisarmed {
        timestamp: DateTime<Utc>,
    },

    /// An acknowledgment arrived while the current tier cannot be dismissed
    AcknowledgeIgnored {
        tier: AlertTier,
        timestamp: DateTime<Utc>,
    },

    /// An SOS must be dispatched
    SosRequested {
        gravity_score: f64,
        timestamp: DateTime<Utc>,
    },

    /// A Critical alert was cleared by an explicit reset
    Reset {
        previous: AlertTier,
        by: String,
        timestamp: DateTime<Utc>,
    },
}

impl AlertEvent {
    /// Get the timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::TierEntered { timestamp, .. } => *timestamp,
            Self::Dismissed { timestamp, .. } => *timestamp,
            Self::Expired { timestamp, .. } => *timestamp,
            Self::ActivationSuppressed { timestamp, .. } => *timestamp,
            Self::EscalationDisarmed { timestamp } => *timestamp,
            Self::AcknowledgeIgnored { timestamp, .. } => *timestamp,
            Self::SosRequested { timestamp, .. } => *timestamp,
            Self::Reset { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TierEntered { .. } => "TierEntered",
            Self::Dismissed { .. } => "Dismissed",
            Self::Expired { .. } => "Expired",
            Self::ActivationSuppressed { .. } => "ActivationSuppressed",
            Self::EscalationDisarmed { .. } => "EscalationDisarmed",
            Self::AcknowledgeIgnored { .. } => "AcknowledgeIgnored",
            Self::SosRequested { .. } => "SosRequested",
            Self::Reset { .. } => "Reset",
        }
    }

    /// Whether the event changed the visible tier
    pub fn changes_tier(&self) -> bool {
        matches!(
            self,
            Self::TierEntered { .. } | Self::Dismissed { .. } | Self::Expired { .. } | Self::Reset { .. }
        )
    }
}
