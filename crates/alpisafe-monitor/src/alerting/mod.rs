//! Alerting context: the tier lifecycle, alert generation and SOS dispatch.

mod dispatcher;
mod generator;
pub mod lifecycle;

pub use dispatcher::{
    AlertDispatcher, AlertHandler, ChannelSosHandler, LoggingAlertHandler, SosHandler,
};
pub use generator::AlertGenerator;
pub use lifecycle::{
    AlertState, AlertStateMachine, Outcome, SampleInput, TimerCommand, TimerFired, TimerKind,
    TimerSpec,
};

use crate::domain::AlertTier;

/// Errors raised by the alerting context
#[derive(Debug, thiserror::Error)]
pub enum AlertingError {
    /// The lifecycle reached a state it must never reach
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// No alert exists for this tier
    #[error("Tier {0} does not raise an alert")]
    NotAlertable(AlertTier),

    /// A handler failed to deliver
    #[error("Handler `{handler}` failed: {reason}")]
    Handler {
        /// Handler name
        handler: String,
        /// Failure description
        reason: String,
    },
}
