//! Alert dispatching and SOS delivery.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::{AlertGenerator, AlertingError};
use crate::assessment::AssessedReading;
use crate::config::AlertTimings;
use crate::domain::{Alert, AlertEvent, AlertResolution, AlertStatus, AlertTier, ResolutionType, SosRequest};

/// Resolved alerts kept for inspection
const HISTORY_LIMIT: usize = 128;

/// Recent SOS requests kept for inspection
const SOS_LOG_LIMIT: usize = 32;

/// Upper bound on a single handler call. Dispatch runs on the monitor loop.
const HANDLER_TIMEOUT: Duration = Duration::from_secs(2);

/// Turns lifecycle events into alerts and fans them out to handlers.
///
/// Holds at most one active alert: the monitor has a single tier at a time.
pub struct AlertDispatcher {
    generator: AlertGenerator,
    active: RwLock<Option<Alert>>,
    history: RwLock<Vec<Alert>>,
    sos_log: RwLock<Vec<SosRequest>>,
    sos_total: AtomicUsize,
    handlers: Vec<Box<dyn AlertHandler>>,
    sos_handlers: Vec<Box<dyn SosHandler>>,
}

impl AlertDispatcher {
    /// Create a dispatcher with no handlers
    pub fn new() -> Self {
        Self {
            generator: AlertGenerator::default(),
            active: RwLock::new(None),
            history: RwLock::new(Vec::new()),
            sos_log: RwLock::new(Vec::new()),
            sos_total: AtomicUsize::new(0),
            handlers: Vec::new(),
            sos_handlers: Vec::new(),
        }
    }

    /// Add an alert handler
    pub fn add_handler(&mut self, handler: Box<dyn AlertHandler>) {
        self.handlers.push(handler);
    }

    /// Add an SOS handler
    pub fn add_sos_handler(&mut self, handler: Box<dyn SosHandler>) {
        self.sos_handlers.push(handler);
    }

    pub(crate) fn set_timings(&mut self, timings: AlertTimings) {
        self.generator = AlertGenerator::new(timings);
    }

    /// Apply lifecycle events in order.
    ///
    /// Handler failures are logged and never abort dispatch.
    ///
    /// # Errors
    ///
    /// Fails when an event cannot be represented: an SOS request without an
    /// active Critical alert, or a tier entry into Normal.
    pub async fn apply(
        &self,
        events: &[AlertEvent],
        latest: Option<&AssessedReading>,
    ) -> Result<(), AlertingError> {
        for event in events {
            match event {
                AlertEvent::TierEntered {
                    tier,
                    gravity_score,
                    deadline,
                    timestamp,
                    ..
                } => {
                    self.close_active(ResolutionType::Superseded, None, *timestamp).await;
                    let alert = self
                        .generator
                        .generate(*tier, latest, *gravity_score, *deadline, *timestamp)?;
                    self.dispatch(alert).await;
                }
                AlertEvent::Dismissed { timestamp, .. } => {
                    self.close_active(ResolutionType::Dismissed, Some("wearer"), *timestamp)
                        .await;
                }
                AlertEvent::Expired { timestamp, .. } => {
                    self.close_active(ResolutionType::Expired, None, *timestamp).await;
                }
                AlertEvent::Reset { by, timestamp, .. } => {
                    self.close_active(ResolutionType::Reset, Some(by), *timestamp).await;
                }
                AlertEvent::SosRequested { timestamp, .. } => {
                    self.dispatch_sos(latest, *timestamp).await?;
                }
                AlertEvent::ActivationSuppressed { .. }
                | AlertEvent::EscalationDisarmed { .. }
                | AlertEvent::AcknowledgeIgnored { .. } => {}
            }
        }
        Ok(())
    }

    /// Currently shown alert
    pub fn active(&self) -> Option<Alert> {
        self.active.read().clone()
    }

    /// Recently closed alerts, oldest first
    pub fn history(&self) -> Vec<Alert> {
        self.history.read().clone()
    }

    /// Recent SOS requests, oldest first
    pub fn sos_requests(&self) -> Vec<SosRequest> {
        self.sos_log.read().clone()
    }

    /// Number of SOS requests dispatched since start
    pub fn sos_count(&self) -> usize {
        self.sos_total.load(Ordering::Relaxed)
    }

    async fn dispatch(&self, alert: Alert) {
        let alert_id = alert.id().clone();
        let tier = alert.tier();

        *self.active.write() = Some(alert.clone());

        tracing::info!(
            alert_id = %alert_id,
            tier = ?tier,
            title = %alert.payload().title,
            "Dispatching alert"
        );

        self.notify(&alert).await;
    }

    async fn close_active(
        &self,
        resolution_type: ResolutionType,
        by: Option<&str>,
        at: DateTime<Utc>,
    ) {
        let closed = self.active.write().take().map(|mut alert| {
            if resolution_type == ResolutionType::Dismissed {
                alert.acknowledge(at);
            }
            alert.resolve(AlertResolution {
                resolution_type,
                resolved_by: by.map(str::to_string),
                resolved_at: at,
            });
            alert
        });

        let Some(alert) = closed else {
            return;
        };

        tracing::info!(
            alert_id = %alert.id(),
            resolution = ?resolution_type,
            "Alert resolved"
        );

        push_bounded(&mut *self.history.write(), alert.clone(), HISTORY_LIMIT);

        self.notify(&alert).await;
    }

    async fn dispatch_sos(
        &self,
        latest: Option<&AssessedReading>,
        at: DateTime<Utc>,
    ) -> Result<(), AlertingError> {
        let alert = self
            .active()
            .filter(|alert| alert.tier() == AlertTier::Critical && alert.status() == AlertStatus::Active)
            .ok_or_else(|| {
                AlertingError::InvariantViolation("SOS requested without an active Critical alert".into())
            })?;

        let request = self.generator.sos_request(&alert, latest, at);
        push_bounded(&mut *self.sos_log.write(), request.clone(), SOS_LOG_LIMIT);
        self.sos_total.fetch_add(1, Ordering::Relaxed);

        tracing::warn!(
            alert_id = %request.alert_id,
            score = request.gravity_score,
            latitude = ?request.latitude_deg,
            longitude = ?request.longitude_deg,
            "Dispatching SOS"
        );

        for handler in &self.sos_handlers {
            let result = tokio::time::timeout(HANDLER_TIMEOUT, handler.dispatch(&request))
                .await
                .unwrap_or_else(|_| Err(timed_out(handler.name())));
            if let Err(e) = result {
                tracing::warn!(
                    alert_id = %request.alert_id,
                    handler = %handler.name(),
                    error = %e,
                    "SOS handler failed to deliver request"
                );
            }
        }

        Ok(())
    }

    async fn notify(&self, alert: &Alert) {
        for handler in &self.handlers {
            let result = tokio::time::timeout(HANDLER_TIMEOUT, handler.handle(alert))
                .await
                .unwrap_or_else(|_| Err(timed_out(handler.name())));
            if let Err(e) = result {
                tracing::warn!(
                    alert_id = %alert.id(),
                    handler = %handler.name(),
                    error = %e,
                    "Handler failed to process alert"
                );
            }
        }
    }
}

fn push_bounded<T>(log: &mut Vec<T>, item: T, limit: usize) {
    log.push(item);
    if log.len() > limit {
        let excess = log.len() - limit;
        log.drain(..excess);
    }
}

fn timed_out(handler: &str) -> AlertingError {
    AlertingError::Handler {
        handler: handler.to_string(),
        reason: format!("no response within {}s", HANDLER_TIMEOUT.as_secs()),
    }
}

impl Default for AlertDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler for alert raises and resolutions
#[async_trait::async_trait]
pub trait AlertHandler: Send + Sync {
    /// Handler name
    fn name(&self) -> &str;

    /// Handle an alert; inspect [`Alert::status`] to tell raises from closes
    async fn handle(&self, alert: &Alert) -> Result<(), AlertingError>;
}

/// Handler for SOS requests
#[async_trait::async_trait]
pub trait SosHandler: Send + Sync {
    /// Handler name
    fn name(&self) -> &str;

    /// Deliver an SOS request
    async fn dispatch(&self, request: &SosRequest) -> Result<(), AlertingError>;
}

/// Logs alerts through `tracing`
pub struct LoggingAlertHandler;

#[async_trait::async_trait]
impl AlertHandler for LoggingAlertHandler {
    fn name(&self) -> &str {
        "logging"
    }

    async fn handle(&self, alert: &Alert) -> Result<(), AlertingError> {
        match alert.status() {
            AlertStatus::Active => tracing::info!(
                alert_id = %alert.id(),
                tier = %alert.tier(),
                narrative = %alert.payload().narrative,
                action = %alert.payload().recommended_action,
                "{}",
                alert.payload().title
            ),
            AlertStatus::Acknowledged | AlertStatus::Resolved => tracing::debug!(
                alert_id = %alert.id(),
                tier = %alert.tier(),
                resolution = ?alert.resolution().map(|r| r.resolution_type),
                "Alert closed"
            ),
        }
        Ok(())
    }
}

/// Forwards SOS requests to an external notifier over a channel.
///
/// Never waits for capacity: a request that finds the channel full is
/// reported as a handler failure and dropped.
pub struct ChannelSosHandler {
    sender: mpsc::Sender<SosRequest>,
}

impl ChannelSosHandler {
    /// Wrap an existing sender
    pub fn new(sender: mpsc::Sender<SosRequest>) -> Self {
        Self { sender }
    }

    /// Create a handler and the receiving end of its channel
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SosRequest>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender), receiver)
    }
}

#[async_trait::async_trait]
impl SosHandler for ChannelSosHandler {
    fn name(&self) -> &str {
        "channel"
    }

    async fn dispatch(&self, request: &SosRequest) -> Result<(), AlertingError> {
        self.sender.try_send(request.clone()).map_err(|e| {
            let reason = match e {
                TrySendError::Full(_) => "notifier queue full",
                TrySendError::Closed(_) => "receiver dropped",
            };
            AlertingError::Handler {
                handler: self.name().to_string(),
                reason: reason.to_string(),
            }
        })
    }
}
