//! Monitor event loop.
//!
//! A [`MonitorService`] owns every piece of per-wearer state: the validator,
//! the immobility timer, the acknowledgment edge detector and the alert
//! state machine. Samples, timer expiries and reset commands reach it through
//! one queue and are processed strictly in arrival order. Other tasks talk to
//! it only through a [`MonitorHandle`].

mod clock;
mod status;

pub use clock::{Clock, SystemClock, TokioClock};
pub use status::{MonitorUpdate, UpdateTrigger, WearerCondition, WearerStatus};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::alerting::{
    AlertDispatcher, AlertState, AlertStateMachine, Outcome, SampleInput, TimerCommand, TimerFired,
};
use crate::assessment::{assess, AssessedReading};
use crate::config::{ConfigError, MonitorConfig};
use crate::domain::{AlertEvent, RawSample};
use crate::tracking::ImmobilityTimer;
use crate::validation::{AcknowledgeEdge, ReadingValidator, ValidatedSample};
use crate::MonitorError;

/// Messages serialized through the monitor queue
#[derive(Debug)]
enum MonitorEvent {
    Sample(RawSample),
    TimerFired(TimerFired),
    Reset { by: String },
    Shutdown,
}

// ---------------------------------------------------------------------------
// MonitorHandle
// ---------------------------------------------------------------------------

/// Cloneable handle to a running monitor
#[derive(Clone)]
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorEvent>,
    updates: broadcast::Sender<MonitorUpdate>,
    dispatcher: Arc<AlertDispatcher>,
}

impl MonitorHandle {
    /// Queue a raw sample
    pub async fn submit(&self, sample: RawSample) -> Result<(), MonitorError> {
        self.send(MonitorEvent::Sample(sample)).await
    }

    /// Clear a Critical alert. Ignored in any other tier.
    pub async fn reset(&self, by: impl Into<String>) -> Result<(), MonitorError> {
        self.send(MonitorEvent::Reset { by: by.into() }).await
    }

    /// Stop the event loop after the events already queued
    pub async fn shutdown(&self) -> Result<(), MonitorError> {
        self.send(MonitorEvent::Shutdown).await
    }

    /// Subscribe to status updates
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorUpdate> {
        self.updates.subscribe()
    }

    /// The dispatcher holding active alerts and SOS history
    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    async fn send(&self, event: MonitorEvent) -> Result<(), MonitorError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| MonitorError::ChannelClosed("monitor is not running".into()))
    }
}

// ---------------------------------------------------------------------------
// MonitorService
// ---------------------------------------------------------------------------

/// Single owner of a wearer's monitoring state
pub struct MonitorService<C: Clock = SystemClock> {
    clock: C,
    validator: ReadingValidator,
    immobility: ImmobilityTimer,
    acknowledge: AcknowledgeEdge,
    machine: AlertStateMachine,
    dispatcher: Arc<AlertDispatcher>,
    latest: Option<AssessedReading>,
    receiver: mpsc::Receiver<MonitorEvent>,
    timer_sender: mpsc::WeakSender<MonitorEvent>,
    updates: broadcast::Sender<MonitorUpdate>,
    timer_task: Option<JoinHandle<()>>,
}

impl MonitorService<SystemClock> {
    /// Create a monitor on the system clock.
    ///
    /// # Errors
    ///
    /// Returns the first invalid configuration value.
    pub fn new(
        config: MonitorConfig,
        dispatcher: AlertDispatcher,
    ) -> Result<(Self, MonitorHandle), ConfigError> {
        Self::with_clock(config, dispatcher, SystemClock)
    }
}

impl<C: Clock> MonitorService<C> {
    /// Create a monitor on the given clock.
    ///
    /// # Errors
    ///
    /// Returns the first invalid configuration value.
    pub fn with_clock(
        config: MonitorConfig,
        mut dispatcher: AlertDispatcher,
        clock: C,
    ) -> Result<(Self, MonitorHandle), ConfigError> {
        config.validate()?;
        dispatcher.set_timings(config.timings.clone());
        let dispatcher = Arc::new(dispatcher);

        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let (updates, _) = broadcast::channel(config.broadcast_capacity);

        let handle = MonitorHandle {
            sender: sender.clone(),
            updates: updates.clone(),
            dispatcher: Arc::clone(&dispatcher),
        };

        let now = clock.now();
        let service = Self {
            validator: ReadingValidator::new(config.bounds.clone()),
            immobility: ImmobilityTimer::new(),
            acknowledge: AcknowledgeEdge::new(),
            machine: AlertStateMachine::new(config.timings, now),
            clock,
            dispatcher,
            latest: None,
            receiver,
            timer_sender: sender.downgrade(),
            updates,
            timer_task: None,
        };

        Ok((service, handle))
    }

    /// Current lifecycle state
    pub fn state(&self) -> &AlertState {
        self.machine.state()
    }

    /// Run until shutdown or until every handle is dropped.
    ///
    /// Rejected samples are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Alerting`] when the alert lifecycle reaches an
    /// impossible state. The loop stops and no further events are processed.
    pub async fn run(mut self) -> Result<(), MonitorError> {
        let timings = self.machine.timings();
        tracing::info!(
            pre_countdown_secs = timings.pre_countdown_secs,
            serious_countdown_secs = timings.serious_countdown_secs,
            cooldown_secs = timings.cooldown_secs,
            "Monitor started"
        );

        while let Some(event) = self.receiver.recv().await {
            let result = match event {
                MonitorEvent::Sample(sample) => self.on_sample(sample).await,
                MonitorEvent::TimerFired(fired) => self.on_timer(fired).await,
                MonitorEvent::Reset { by } => self.on_reset(&by).await,
                MonitorEvent::Shutdown => {
                    tracing::info!("Monitor shutting down");
                    break;
                }
            };

            if let Err(e) = result {
                tracing::error!(error = %e, tier = %self.machine.state().tier(), "Monitor stopped");
                self.cancel_timer();
                return Err(e);
            }
        }

        self.cancel_timer();
        Ok(())
    }

    async fn on_sample(&mut self, sample: RawSample) -> Result<(), MonitorError> {
        let validated = match self.validator.validate(&sample) {
            Ok(validated) => validated,
            Err(e) => {
                tracing::warn!(error = %e, "Sample rejected");
                return Ok(());
            }
        };

        for issue in &validated.report.issues {
            tracing::warn!(issue = %issue, "Validation issue");
        }

        let device_seconds = validated.fresh_immobile_seconds();
        let ValidatedSample { mut reading, report } = validated;

        let immobility =
            self.immobility
                .observe(reading.sample_time_unix, reading.movement, device_seconds);
        reading.immobile_seconds = immobility.seconds;

        let assessment = assess(&reading);
        let acknowledge = self.acknowledge.update(reading.button_pressed);
        let now = self.clock.now();

        tracing::debug!(
            score = %assessment.gravity,
            narrative = %assessment.narrative,
            immobile_minutes = immobility.minutes(),
            immobility_source = ?immobility.source,
            acknowledge,
            "Sample assessed"
        );

        let outcome = self.machine.on_sample(
            SampleInput {
                score: assessment.gravity.value(),
                moving: reading.movement,
                acknowledge,
            },
            now,
        );

        self.latest = Some(AssessedReading {
            reading,
            report,
            assessment,
        });

        self.apply(outcome, UpdateTrigger::Sample, now).await
    }

    async fn on_timer(&mut self, fired: TimerFired) -> Result<(), MonitorError> {
        let now = self.clock.now();
        let outcome = self.machine.on_timer(fired, now)?;
        if outcome.is_empty() {
            return Ok(());
        }
        self.apply(outcome, UpdateTrigger::Timer(fired.kind), now).await
    }

    async fn on_reset(&mut self, by: &str) -> Result<(), MonitorError> {
        let now = self.clock.now();
        let outcome = self.machine.reset(by, now);
        if outcome.is_empty() {
            return Ok(());
        }
        self.apply(outcome, UpdateTrigger::Reset, now).await
    }

    async fn apply(
        &mut self,
        outcome: Outcome,
        trigger: UpdateTrigger,
        now: DateTime<Utc>,
    ) -> Result<(), MonitorError> {
        self.dispatcher
            .apply(&outcome.events, self.latest.as_ref())
            .await?;
        self.schedule(outcome.timer, now);
        self.publish(trigger, outcome.events, now);
        Ok(())
    }

    fn schedule(&mut self, command: TimerCommand, now: DateTime<Utc>) {
        match command {
            TimerCommand::Keep => {}
            TimerCommand::Cancel => self.cancel_timer(),
            TimerCommand::Arm(spec) => {
                self.cancel_timer();

                let delay = (spec.deadline - now).to_std().unwrap_or_default();
                let sender = self.timer_sender.clone();
                let fired = spec.fired();

                tracing::debug!(
                    generation = fired.generation,
                    kind = ?fired.kind,
                    deadline = %spec.deadline,
                    "Countdown armed"
                );

                self.timer_task = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(sender) = sender.upgrade() {
                        // A closed queue means the monitor already stopped.
                        let _ = sender.send(MonitorEvent::TimerFired(fired)).await;
                    }
                }));
            }
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(task) = self.timer_task.take() {
            task.abort();
        }
    }

    fn publish(&self, trigger: UpdateTrigger, events: Vec<AlertEvent>, now: DateTime<Utc>) {
        let Some(latest) = &self.latest else {
            return;
        };

        let update = MonitorUpdate {
            trigger,
            status: WearerStatus::new(latest, self.machine.state(), now),
            events,
        };

        if self.updates.send(update).is_err() {
            tracing::trace!("No update subscribers");
        }
    }
}
