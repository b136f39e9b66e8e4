//! Alert types for wearer notifications and SOS requests.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::AlertTier;

/// Unique identifier for an alert
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(Uuid);

impl AlertId {
    /// Create a new random alert ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payload containing alert details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPayload {
    /// Human-readable title
    pub title: String,
    /// Detailed message
    pub message: String,
    /// Clinical narrative label at the time of the alert
    pub narrative: String,
    /// Gravity score at the time of the alert
    pub gravity_score: f64,
    /// Recommended action
    pub recommended_action: String,
    /// Countdown deadline (Pre and Serious only)
    pub deadline: Option<DateTime<Utc>>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
}

impl AlertPayload {
    /// Create a new alert payload
    pub fn new(title: impl Into<String>, message: impl Into<String>, gravity_score: f64) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            narrative: String::new(),
            gravity_score,
            recommended_action: String::new(),
            deadline: None,
            metadata: HashMap::new(),
        }
    }

    /// Set narrative
    pub fn with_narrative(mut self, narrative: impl Into<String>) -> Self {
        self.narrative = narrative.into();
        self
    }

    /// Set recommended action
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.recommended_action = action.into();
        self
    }

    /// Set deadline
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Status of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    /// Alert is shown and awaiting acknowledgment or expiry
    Active,
    /// Alert was dismissed by the wearer
    Acknowledged,
    /// Alert is closed
    Resolved,
}

/// Types of alert resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionType {
    /// Wearer acknowledged and dismissed the alert
    Dismissed,
    /// Countdown elapsed and the alert auto-dismissed
    Expired,
    /// A higher tier replaced the alert
    Superseded,
    /// Critical alert cleared by an explicit reset
    Reset,
}

/// Resolution details for a closed alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertResolution {
    /// Resolution type
    pub resolution_type: ResolutionType,
    /// Who resolved the alert, when known
    pub resolved_by: Option<String>,
    /// Resolution time
    pub resolved_at: DateTime<Utc>,
}

/// An alert raised for the wearer and observers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    id: AlertId,
    tier: AlertTier,
    payload: AlertPayload,
    status: AlertStatus,
    created_at: DateTime<Utc>,
    acknowledged_at: Option<DateTime<Utc>>,
    resolution: Option<AlertResolution>,
}

impl Alert {
    /// Create a new alert
    pub fn new(tier: AlertTier, payload: AlertPayload, created_at: DateTime<Utc>) -> Self {
        Self {
            id: AlertId::new(),
            tier,
            payload,
            status: AlertStatus::Active,
            created_at,
            acknowledged_at: None,
            resolution: None,
        }
    }

    /// Get the alert ID
    pub fn id(&self) -> &AlertId {
        &self.id
    }

    /// Get the tier
    pub fn tier(&self) -> AlertTier {
        self.tier
    }

    /// Get the payload
    pub fn payload(&self) -> &AlertPayload {
        &self.payload
    }

    /// Get the status
    pub fn status(&self) -> AlertStatus {
        self.status
    }

    /// Get creation time
    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    /// Get acknowledgement time
    pub fn acknowledged_at(&self) -> Option<&DateTime<Utc>> {
        self.acknowledged_at.as_ref()
    }

    /// Get resolution
    pub fn resolution(&self) -> Option<&AlertResolution> {
        self.resolution.as_ref()
    }

    /// Check if alert is still shown
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }

    /// Mark the alert as acknowledged by the wearer
    pub fn acknowledge(&mut self, at: DateTime<Utc>) {
        self.status = AlertStatus::Acknowledged;
        self.acknowledged_at = Some(at);
    }

    /// Close the alert
    pub fn resolve(&mut self, resolution: AlertResolution) {
        self.status = AlertStatus::Resolved;
        self.resolution = Some(resolution);
    }

    /// Time since the alert was raised
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// Time left before the countdown deadline, if any
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.payload
            .deadline
            .map(|deadline| (deadline - now).max(Duration::zero()))
    }
}

/// Request to raise an SOS with external emergency services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SosRequest {
    /// Alert that triggered the request
    pub alert_id: AlertId,
    /// Gravity score at escalation time
    pub gravity_score: f64,
    /// Clinical narrative label
    pub narrative: String,
    /// Last known latitude, if a fix exists
    pub latitude_deg: Option<f64>,
    /// Last known longitude, if a fix exists
    pub longitude_deg: Option<f64>,
    /// Last known altitude in metres
    pub altitude_m: Option<f64>,
    /// Time of the request
    pub requested_at: DateTime<Utc>,
}
