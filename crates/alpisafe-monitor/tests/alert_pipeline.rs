//! Integration tests for the monitor pipeline.
//!
//! Samples go in through a `MonitorHandle` exactly as a device bridge would
//! send them, and behaviour is observed on the update broadcast and the SOS
//! channel. Tokio time is paused, so countdowns elapse instantly and
//! deterministically.

use std::time::Duration;

use alpisafe_monitor::{
    AlertDispatcher, AlertEvent, AlertTier, ChannelSosHandler, MonitorConfig, MonitorError,
    MonitorHandle, MonitorService, MonitorUpdate, RawSample, SosRequest, TimerKind, TokioClock,
    UpdateTrigger,
};
use approx::assert_abs_diff_eq;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;

const T0: i64 = 1_707_557_400;

/// Build a sample. `immobile_secs` of `None` means the wearer is moving.
fn sample(bpm: f64, core: f64, ambient: f64, immobile_secs: Option<u32>, ts: i64) -> RawSample {
    let raw = RawSample::new()
        .with("BPM", bpm.to_string())
        .with("InternalTemperature", core.to_string())
        .with("ExternalTemperature", ambient.to_string())
        .with("altitude", "3850")
        .with("humidity", "40")
        .with("latitudeDegrees", "45.8326")
        .with("longitudeDegrees", "6.8652")
        .with("speed", "0")
        .with("timestamp", ts.to_string())
        .with("ButtonState", "0");

    match immobile_secs {
        Some(secs) => raw
            .with("movement", "0")
            .with("tempsDimmobilite", secs.to_string()),
        None => raw.with("movement", "1"),
    }
}

fn pressed(raw: RawSample) -> RawSample {
    raw.with("ButtonState", "1")
}

struct Harness {
    handle: MonitorHandle,
    updates: broadcast::Receiver<MonitorUpdate>,
    sos: mpsc::Receiver<SosRequest>,
    task: JoinHandle<Result<(), MonitorError>>,
}

impl Harness {
    fn start() -> Self {
        Self::with_sos_capacity(8)
    }

    fn with_sos_capacity(capacity: usize) -> Self {
        let (sos_handler, sos) = ChannelSosHandler::channel(capacity);
        let mut dispatcher = AlertDispatcher::new();
        dispatcher.add_sos_handler(Box::new(sos_handler));

        let (service, handle) =
            MonitorService::with_clock(MonitorConfig::default(), dispatcher, TokioClock::new())
                .unwrap();
        let updates = handle.subscribe();
        let task = tokio::spawn(service.run());

        Self {
            handle,
            updates,
            sos,
            task,
        }
    }

    async fn send(&mut self, raw: RawSample) -> MonitorUpdate {
        self.handle.submit(raw).await.unwrap();
        self.updates.recv().await.unwrap()
    }

    async fn stop(self) {
        self.handle.shutdown().await.unwrap();
        self.task.await.unwrap().unwrap();
    }
}

fn entered(update: &MonitorUpdate) -> Option<AlertTier> {
    update.events.iter().find_map(|event| match event {
        AlertEvent::TierEntered { tier, .. } => Some(*tier),
        _ => None,
    })
}

#[tokio::test(start_paused = true)]
async fn test_scenario_a_escalates_once() {
    let mut harness = Harness::start();
    let start = Instant::now();

    // hr 38, core 29.5, ambient -18, 20 minutes still
    let update = harness.send(sample(38.0, 29.5, -18.0, Some(1200), T0)).await;
    assert_eq!(update.status.tier(), AlertTier::Serious);
    assert_abs_diff_eq!(update.status.score, 0.75, epsilon = 1e-9);
    assert_eq!(update.status.condition.narrative, "Moderate hypothermia with bradycardia");
    assert_eq!(update.status.countdown_remaining_secs, Some(10));
    assert!(!update.sos_requested());

    // No acknowledgment: the countdown elapses with the wearer still immobile
    let update = harness.updates.recv().await.unwrap();
    assert_eq!(update.trigger, UpdateTrigger::Timer(TimerKind::Escalation));
    assert_eq!(update.status.tier(), AlertTier::Critical);
    assert!(update.sos_requested());

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(11));

    let request = harness.sos.recv().await.unwrap();
    let active = harness.handle.dispatcher().active().unwrap();
    assert_eq!(&request.alert_id, active.id());
    assert_eq!(request.latitude_deg, Some(45.8326));
    assert_eq!(request.narrative, "Moderate hypothermia with bradycardia");

    // Still Critical later on: no second SOS
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(harness.updates.try_recv().is_err());
    assert!(harness.sos.try_recv().is_err());
    assert_eq!(harness.handle.dispatcher().sos_count(), 1);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_scenario_b_stays_normal() {
    let mut harness = Harness::start();

    let update = harness.send(sample(58.0, 35.2, -12.0, None, T0)).await;
    assert_eq!(update.status.tier(), AlertTier::Normal);
    assert_eq!(update.status.score, 0.0);
    assert!(update.events.is_empty());
    assert!(harness.handle.dispatcher().active().is_none());

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_cooldown_suppresses_then_allows() {
    let mut harness = Harness::start();

    let update = harness.send(sample(90.0, 36.8, -8.0, Some(1260), T0)).await;
    assert_eq!(update.status.tier(), AlertTier::Pre);

    tokio::time::advance(Duration::from_secs(1)).await;
    let update = harness
        .send(pressed(sample(90.0, 36.8, -8.0, Some(1261), T0 + 1)))
        .await;
    assert_eq!(update.status.tier(), AlertTier::Normal);
    assert!(update
        .events
        .iter()
        .any(|event| matches!(event, AlertEvent::Dismissed { tier: AlertTier::Pre, .. })));
    assert_eq!(update.status.cooldown_remaining_secs, Some(5));

    // Two seconds after the dismiss the same score stays hidden
    tokio::time::advance(Duration::from_secs(2)).await;
    let update = harness.send(sample(90.0, 36.8, -8.0, Some(1263), T0 + 3)).await;
    assert_eq!(update.status.tier(), AlertTier::Normal);
    assert_eq!(update.status.suppressed_tier, Some(AlertTier::Pre));
    assert_eq!(entered(&update), None);

    // Six seconds after the dismiss it surfaces again
    tokio::time::advance(Duration::from_secs(4)).await;
    let update = harness.send(sample(90.0, 36.8, -8.0, Some(1267), T0 + 7)).await;
    assert_eq!(entered(&update), Some(AlertTier::Pre));
    assert_eq!(update.status.suppressed_tier, None);

    let history = harness.handle.dispatcher().history();
    assert_eq!(history.len(), 1);
    assert!(history[0].acknowledged_at().is_some());

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_pre_then_serious_without_escalating() {
    let mut harness = Harness::start();

    let update = harness.send(sample(70.0, 37.0, -5.0, Some(720), T0)).await;
    assert_eq!(update.status.tier(), AlertTier::Pre);

    tokio::time::advance(Duration::from_secs(10)).await;
    let update = harness.send(sample(45.0, 34.0, -12.0, Some(960), T0 + 10)).await;
    assert_eq!(entered(&update), Some(AlertTier::Serious));
    assert!(!update.sos_requested());
    assert_eq!(harness.handle.dispatcher().active().unwrap().tier(), AlertTier::Serious);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_movement_disarms_escalation() {
    let mut harness = Harness::start();

    let update = harness.send(sample(45.0, 34.0, -12.0, Some(960), T0)).await;
    assert_eq!(update.status.tier(), AlertTier::Serious);

    tokio::time::advance(Duration::from_secs(3)).await;
    let update = harness.send(sample(58.0, 35.2, -12.0, None, T0 + 3)).await;
    assert_eq!(update.status.tier(), AlertTier::Serious);
    assert!(update
        .events
        .iter()
        .any(|event| matches!(event, AlertEvent::EscalationDisarmed { .. })));

    // The countdown now ends in an auto-dismiss instead of an SOS
    let update = harness.updates.recv().await.unwrap();
    assert_eq!(update.trigger, UpdateTrigger::Timer(TimerKind::Escalation));
    assert_eq!(update.status.tier(), AlertTier::Normal);
    assert!(!update.sos_requested());
    assert!(harness.sos.try_recv().is_err());

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_critical_holds_until_reset() {
    let mut harness = Harness::start();

    let update = harness.send(sample(38.0, 29.5, -18.0, Some(1260), T0)).await;
    assert_eq!(update.status.tier(), AlertTier::Critical);
    assert!(update.sos_requested());

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert!(harness.updates.try_recv().is_err());

    // Neither acknowledgment nor a calm reading leaves Critical
    let update = harness
        .send(pressed(sample(38.0, 29.5, -18.0, Some(1860), T0 + 600)))
        .await;
    assert_eq!(update.status.tier(), AlertTier::Critical);
    assert!(update
        .events
        .iter()
        .any(|event| matches!(event, AlertEvent::AcknowledgeIgnored { .. })));

    let update = harness.send(sample(58.0, 35.2, -12.0, None, T0 + 601)).await;
    assert_eq!(update.status.tier(), AlertTier::Critical);

    harness.handle.reset("rescue team").await.unwrap();
    let update = harness.updates.recv().await.unwrap();
    assert_eq!(update.trigger, UpdateTrigger::Reset);
    assert_eq!(update.status.tier(), AlertTier::Normal);
    assert!(harness.handle.dispatcher().active().is_none());
    assert_eq!(harness.handle.dispatcher().sos_count(), 1);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_undrained_sos_channel_keeps_loop_running() {
    let mut harness = Harness::with_sos_capacity(1);

    for round in 0..2 {
        let ts = T0 + round * 10;
        let update = harness.send(sample(38.0, 29.5, -18.0, Some(1260), ts)).await;
        assert_eq!(update.status.tier(), AlertTier::Critical);
        assert!(update.sos_requested());

        harness.handle.reset("rescue team").await.unwrap();
        let update = tokio::time::timeout(Duration::from_secs(60), harness.updates.recv())
            .await
            .expect("reset processed")
            .unwrap();
        assert_eq!(update.trigger, UpdateTrigger::Reset);
    }

    let update = tokio::time::timeout(
        Duration::from_secs(60),
        harness.send(sample(58.0, 35.2, -12.0, None, T0 + 30)),
    )
    .await
    .expect("sample processed");
    assert_eq!(update.status.tier(), AlertTier::Normal);
    assert_eq!(harness.handle.dispatcher().sos_count(), 2);

    // Only the first request fit in the channel
    assert!(harness.sos.recv().await.is_some());
    assert!(harness.sos.try_recv().is_err());

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_reset_outside_critical_is_ignored() {
    let mut harness = Harness::start();

    harness.send(sample(70.0, 37.0, -5.0, Some(720), T0)).await;
    harness.handle.reset("operator").await.unwrap();

    let update = harness.send(sample(70.0, 37.0, -5.0, Some(721), T0 + 1)).await;
    assert_eq!(update.trigger, UpdateTrigger::Sample);
    assert_eq!(update.status.tier(), AlertTier::Pre);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_first_sample_without_heart_rate_is_rejected() {
    let mut harness = Harness::start();

    let mut missing = sample(38.0, 29.5, -18.0, Some(1200), T0);
    missing.bpm = None;
    harness.handle.submit(missing).await.unwrap();

    let update = harness.send(sample(72.0, 36.5, 5.0, None, T0 + 1)).await;
    assert_eq!(update.status.tier(), AlertTier::Normal);
    assert_abs_diff_eq!(update.status.score, 0.15, epsilon = 1e-9);
    assert!(harness.handle.dispatcher().active().is_none());

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stale_field_reuses_last_value() {
    let mut harness = Harness::start();

    harness.send(sample(38.0, 29.5, -18.0, Some(1200), T0)).await;

    let mut partial = sample(38.0, 29.5, -18.0, Some(1200), T0 + 1);
    partial.internal_temperature = Some("n/a".into());
    let update = harness.send(partial).await;

    assert!(!update.status.stale.is_empty());
    assert_eq!(update.status.condition.narrative, "Moderate hypothermia with bradycardia");

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_status_uses_boundary_names() {
    let mut harness = Harness::start();

    let update = harness.send(sample(38.0, 29.5, -18.0, Some(1260), T0)).await;
    let value = serde_json::to_value(&update.status).unwrap();

    assert_eq!(value["EtatDeLalpiniste"]["tier"], "critical");
    assert!(value["ScoreDeGravite"].as_f64().unwrap() >= 0.8);
    assert_eq!(value["immobileMinutes"], 21.0);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_submit_after_shutdown_fails() {
    let harness = Harness::start();
    let handle = harness.handle.clone();
    harness.stop().await;

    let result = handle.submit(sample(72.0, 36.5, 5.0, None, T0)).await;
    assert!(matches!(result, Err(MonitorError::ChannelClosed(_))));
}
