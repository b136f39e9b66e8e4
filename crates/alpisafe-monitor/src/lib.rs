//! # AlpiSafe Monitor
//!
//! Decision core for a wearable mountaineering safety device.
//!
//! The crate ingests periodic telemetry from a wearer (heart rate, core and
//! ambient temperature, motion, immobility duration, altitude, humidity, GPS)
//! and decides how urgent the wearer's situation is and whether to escalate
//! toward an automatic emergency signal (SOS).
//!
//! ## Features
//!
//! - **Reading Validation**: string field contract parsing, range clamping,
//!   known-good retention for stale fields
//! - **Severity Scoring**: four bounded subscores composed into a gravity score
//! - **Clinical Narrative**: ordered condition cascade with a category and label
//! - **Alert Lifecycle**: Pre / Serious / Critical tiers with countdowns,
//!   acknowledgment cooldown, automatic escalation and SOS dispatch
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     alpisafe-monitor                     │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌────────────┐  ┌────────────┐  ┌────────────────────┐  │
//! │  │ Validation │─▶│ Assessment │─▶│     Alerting       │  │
//! │  │  Context   │  │  Context   │  │ (state machine,    │  │
//! │  └─────┬──────┘  └─────▲──────┘  │  dispatch, SOS)    │  │
//! │        │         ┌─────┴──────┐  └─────────▲──────────┘  │
//! │        └────────▶│  Tracking  │            │             │
//! │                  │(immobility)│  ┌─────────┴──────────┐  │
//! │                  └────────────┘  │  Monitor event loop │  │
//! │                                  └────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use alpisafe_monitor::{
//!     AlertDispatcher, MonitorConfig, MonitorService, RawSample,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = MonitorConfig::builder()
//!         .serious_countdown_secs(10)
//!         .build();
//!
//!     let (service, handle) = MonitorService::new(config, AlertDispatcher::new())?;
//!     let mut updates = handle.subscribe();
//!     tokio::spawn(service.run());
//!
//!     let sample: RawSample = serde_json::from_str(
//!         r#"{"BPM":"38","InternalTemperature":"29.5","ExternalTemperature":"-18",
//!             "movement":"0","tempsDimmobilite":"1200","timestamp":"1700000000"}"#,
//!     )?;
//!     handle.submit(sample).await?;
//!
//!     let update = updates.recv().await?;
//!     println!("{}", serde_json::to_string(&update.status)?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod alerting;
pub mod assessment;
pub mod config;
pub mod domain;
pub mod monitor;
pub mod tracking;
pub mod validation;

// Re-export main types
pub use domain::{
    alert::{Alert, AlertId, AlertPayload, AlertResolution, AlertStatus, ResolutionType, SosRequest},
    events::{AlertEvent, EntryCause},
    reading::Reading,
    sample::RawSample,
    tier::{AlertTier, TierPresentation},
};

pub use assessment::{
    assess, classify, AssessedReading, Assessment, ClinicalNarrative, GravityScore,
    NarrativeBranch, NarrativeCategory, Subscores,
};

pub use alerting::{
    AlertDispatcher, AlertGenerator, AlertHandler, AlertStateMachine, AlertState,
    AlertingError, ChannelSosHandler, LoggingAlertHandler, SosHandler, TimerKind,
};

pub use config::{AlertTimings, Bound, ConfigError, MonitorConfig, ValidationBounds};

pub use monitor::{
    Clock, MonitorHandle, MonitorService, MonitorUpdate, SystemClock, TokioClock, UpdateTrigger,
    WearerCondition, WearerStatus,
};

pub use tracking::ImmobilityTimer;

pub use validation::{
    AcknowledgeEdge, Field, ReadingValidator, ValidatedSample, ValidationError, ValidationIssue,
    ValidationReport,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common result type for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Unified error type for monitor operations
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A sample could not be turned into a reading
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Alert lifecycle or dispatch error
    #[error("Alerting error: {0}")]
    Alerting(#[from] AlertingError),

    /// The monitor event loop is no longer running
    #[error("Monitor channel closed: {0}")]
    ChannelClosed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        assess, classify, AlertDispatcher, AlertEvent, AlertState, AlertStateMachine, AlertTier,
        Assessment, ClinicalNarrative, GravityScore, MonitorConfig, MonitorError, MonitorHandle,
        MonitorService, MonitorUpdate, RawSample, Reading, ReadingValidator, Result, Subscores,
        WearerStatus,
    };
}
