//! Alert lifecycle state machine.
//!
//! Manages the tier of a single wearer:
//! Normal → Pre → Serious → Critical, with countdown expiry back to Normal,
//! acknowledgment dismiss (plus cooldown) back to Normal, automatic Serious →
//! Critical escalation, and an explicit reset out of Critical.
//!
//! The machine never reads a clock and never sleeps. Callers pass `now` in
//! and arm the timers described by [`Outcome::timer`]; expiry comes back
//! through [`AlertStateMachine::on_timer`]. Every transition bumps the
//! generation, and a timer only acts on the generation it was armed for.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::AlertingError;
use crate::config::AlertTimings;
use crate::domain::{AlertEvent, AlertTier, EntryCause};

/// What a countdown does when it elapses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Pre countdown: back to Normal
    AutoDismiss,
    /// Serious countdown: to Critical if still armed, else back to Normal
    Escalation,
}

/// Timer expiry message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerFired {
    /// Generation the timer was armed for
    pub generation: u64,
    /// Timer kind
    pub kind: TimerKind,
}

/// A timer the caller must arm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSpec {
    /// Generation the timer belongs to
    pub generation: u64,
    /// Timer kind
    pub kind: TimerKind,
    /// When the timer fires
    pub deadline: DateTime<Utc>,
}

impl TimerSpec {
    /// The message to deliver once the deadline passes
    pub fn fired(&self) -> TimerFired {
        TimerFired {
            generation: self.generation,
            kind: self.kind,
        }
    }
}

/// Instruction for the pending countdown timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerCommand {
    /// Leave the current timer as it is
    #[default]
    Keep,
    /// Replace the current timer
    Arm(TimerSpec),
    /// Drop the current timer
    Cancel,
}

/// Events and timer instruction produced by one input
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outcome {
    /// Events, in the order they happened
    pub events: Vec<AlertEvent>,
    /// Timer instruction; the last transition wins
    pub timer: TimerCommand,
}

impl Outcome {
    /// Whether nothing happened
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.timer == TimerCommand::Keep
    }

    /// Tier entered by this input, if any
    pub fn entered(&self) -> Option<AlertTier> {
        self.events.iter().rev().find_map(|event| match event {
            AlertEvent::TierEntered { tier, .. } => Some(*tier),
            _ => None,
        })
    }

    /// Whether an SOS was requested
    pub fn sos_requested(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, AlertEvent::SosRequested { .. }))
    }
}

/// Per-sample input of the state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleInput {
    /// Gravity score in `[0, 1]`
    pub score: f64,
    /// Whether the wearer is moving
    pub moving: bool,
    /// Rising edge of the acknowledgment button
    pub acknowledge: bool,
}

/// Mutable lifecycle state, owned by one [`AlertStateMachine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertState {
    tier: AlertTier,
    tier_entered_at: DateTime<Utc>,
    acknowledged: bool,
    cooldown_until: Option<DateTime<Utc>>,
    deadline: Option<DateTime<Utc>>,
    generation: u64,
    escalation_armed: bool,
    suppressed_tier: Option<AlertTier>,
    last_score: f64,
}

impl AlertState {
    /// Initial state: Normal, nothing outstanding
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            tier: AlertTier::Normal,
            tier_entered_at: now,
            acknowledged: true,
            cooldown_until: None,
            deadline: None,
            generation: 0,
            escalation_armed: false,
            suppressed_tier: None,
            last_score: 0.0,
        }
    }

    /// Current tier
    pub fn tier(&self) -> AlertTier {
        self.tier
    }

    /// When the current tier was entered
    pub fn tier_entered_at(&self) -> DateTime<Utc> {
        self.tier_entered_at
    }

    /// Whether nothing is awaiting acknowledgment
    pub fn acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// End of the re-activation cooldown
    pub fn cooldown_until(&self) -> Option<DateTime<Utc>> {
        self.cooldown_until
    }

    /// Countdown deadline (Pre and Serious only)
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Transition counter
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the Serious countdown will escalate to Critical
    pub fn escalation_armed(&self) -> bool {
        self.escalation_armed
    }

    /// Activation held back by the cooldown on the last sample
    pub fn suppressed_tier(&self) -> Option<AlertTier> {
        self.suppressed_tier
    }

    /// Score of the last sample
    pub fn last_score(&self) -> f64 {
        self.last_score
    }

    /// Whether activations at or below Serious are held back
    pub fn in_cooldown(&self, now: DateTime<Utc>) -> bool {
        matches!(self.cooldown_until, Some(until) if now < until)
    }

    /// Time left on the countdown, if one runs
    pub fn countdown_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.deadline
            .map(|deadline| (deadline - now).max(Duration::zero()))
    }

    /// Time left before activations surface again
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.cooldown_until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    /// The timer that should currently be pending
    pub fn armed_timer(&self) -> Option<TimerSpec> {
        let kind = match self.tier {
            AlertTier::Pre => TimerKind::AutoDismiss,
            AlertTier::Serious => TimerKind::Escalation,
            AlertTier::Normal | AlertTier::Critical => return None,
        };
        self.deadline.map(|deadline| TimerSpec {
            generation: self.generation,
            kind,
            deadline,
        })
    }
}

/// Drives an [`AlertState`] from samples, timer expiries and resets.
///
/// Identical `(state, input, now)` always yields the identical outcome.
#[derive(Debug, Clone)]
pub struct AlertStateMachine {
    state: AlertState,
    timings: AlertTimings,
}

impl AlertStateMachine {
    /// Create a machine in the initial Normal state
    pub fn new(timings: AlertTimings, now: DateTime<Utc>) -> Self {
        Self {
            state: AlertState::new(now),
            timings,
        }
    }

    /// Get the current state
    pub fn state(&self) -> &AlertState {
        &self.state
    }

    /// Get the timings
    pub fn timings(&self) -> &AlertTimings {
        &self.timings
    }

    /// Process one sample.
    ///
    /// Order: movement disarms a pending escalation, then the acknowledgment
    /// edge is handled, then the score's candidate tier is compared with the
    /// current tier.
    pub fn on_sample(&mut self, input: SampleInput, now: DateTime<Utc>) -> Outcome {
        let mut outcome = Outcome::default();
        self.state.last_score = input.score;
        self.state.suppressed_tier = None;

        if !self.state.in_cooldown(now) {
            self.state.cooldown_until = None;
        }

        if input.moving && self.state.tier == AlertTier::Serious && self.state.escalation_armed {
            self.state.escalation_armed = false;
            tracing::info!(generation = self.state.generation, "Movement resumed, escalation disarmed");
            outcome.events.push(AlertEvent::EscalationDisarmed { timestamp: now });
        }

        if input.acknowledge {
            self.acknowledge(now, &mut outcome);
        }

        let candidate = AlertTier::from_score(input.score);
        if candidate > self.state.tier {
            match self.state.cooldown_until {
                Some(until) if candidate != AlertTier::Critical => {
                    self.state.suppressed_tier = Some(candidate);
                    tracing::debug!(
                        candidate = %candidate,
                        cooldown_until = %until,
                        score = input.score,
                        "Activation suppressed by cooldown"
                    );
                    outcome.events.push(AlertEvent::ActivationSuppressed {
                        candidate,
                        cooldown_until: until,
                        timestamp: now,
                    });
                }
                _ => self.enter(candidate, EntryCause::Score, input.moving, now, &mut outcome),
            }
        }

        outcome
    }

    /// Process a timer expiry.
    ///
    /// # Errors
    ///
    /// Returns [`AlertingError::InvariantViolation`] when the timer belongs to
    /// a generation the machine never issued, or when its kind does not match
    /// the countdown of the current tier.
    pub fn on_timer(&mut self, fired: TimerFired, now: DateTime<Utc>) -> Result<Outcome, AlertingError> {
        let current = self.state.generation;
        if fired.generation < current {
            tracing::debug!(
                timer_generation = fired.generation,
                generation = current,
                kind = ?fired.kind,
                "Ignoring stale timer"
            );
            return Ok(Outcome::default());
        }
        if fired.generation > current {
            return Err(AlertingError::InvariantViolation(format!(
                "timer generation {} is ahead of machine generation {}",
                fired.generation, current
            )));
        }

        let mut outcome = Outcome::default();
        match (self.state.tier, fired.kind) {
            (AlertTier::Pre, TimerKind::AutoDismiss) => self.expire(now, &mut outcome),
            (AlertTier::Serious, TimerKind::Escalation) if self.state.escalation_armed => {
                self.enter(AlertTier::Critical, EntryCause::Escalation, false, now, &mut outcome)
            }
            (AlertTier::Serious, TimerKind::Escalation) => self.expire(now, &mut outcome),
            (tier, kind) => {
                return Err(AlertingError::InvariantViolation(format!(
                    "{kind:?} timer fired in tier {tier} (generation {current})"
                )));
            }
        }
        Ok(outcome)
    }

    /// Clear a Critical alert. A no-op in any other tier.
    pub fn reset(&mut self, by: &str, now: DateTime<Utc>) -> Outcome {
        let mut outcome = Outcome::default();
        if self.state.tier != AlertTier::Critical {
            tracing::debug!(tier = %self.state.tier, by, "Reset ignored outside Critical");
            return outcome;
        }

        self.leave_to_normal(now);
        tracing::info!(by, generation = self.state.generation, "Critical alert reset");
        outcome.events.push(AlertEvent::Reset {
            previous: AlertTier::Critical,
            by: by.to_string(),
            timestamp: now,
        });
        outcome.timer = TimerCommand::Cancel;
        outcome
    }

    fn acknowledge(&mut self, now: DateTime<Utc>, outcome: &mut Outcome) {
        let tier = self.state.tier;

        if tier.is_dismissible() && !self.state.in_cooldown(now) {
            let cooldown_until = now + self.timings.cooldown();
            self.leave_to_normal(now);
            self.state.cooldown_until = Some(cooldown_until);

            tracing::info!(
                tier = %tier,
                cooldown_until = %cooldown_until,
                "Alert dismissed by acknowledgment"
            );
            outcome.events.push(AlertEvent::Dismissed {
                tier,
                cooldown_until,
                timestamp: now,
            });
            outcome.timer = TimerCommand::Cancel;
        } else if tier.is_alerting() {
            tracing::debug!(tier = %tier, "Acknowledgment ignored");
            outcome.events.push(AlertEvent::AcknowledgeIgnored { tier, timestamp: now });
        }
    }

    fn enter(
        &mut self,
        tier: AlertTier,
        cause: EntryCause,
        moving: bool,
        now: DateTime<Utc>,
        outcome: &mut Outcome,
    ) {
        let previous = self.state.tier;
        let deadline = match tier {
            AlertTier::Pre => Some(now + self.timings.pre_countdown()),
            AlertTier::Serious => Some(now + self.timings.serious_countdown()),
            AlertTier::Normal | AlertTier::Critical => None,
        };

        self.state.generation += 1;
        self.state.tier = tier;
        self.state.tier_entered_at = now;
        self.state.acknowledged = false;
        self.state.deadline = deadline;
        self.state.escalation_armed = tier == AlertTier::Serious && !moving;
        self.state.suppressed_tier = None;

        let generation = self.state.generation;
        let gravity_score = self.state.last_score;

        tracing::info!(
            tier = %tier,
            previous = %previous,
            cause = ?cause,
            score = gravity_score,
            generation,
            "Alert tier entered"
        );
        outcome.events.push(AlertEvent::TierEntered {
            tier,
            previous,
            cause,
            gravity_score,
            deadline,
            generation,
            timestamp: now,
        });

        outcome.timer = match self.state.armed_timer() {
            Some(spec) => TimerCommand::Arm(spec),
            None => TimerCommand::Cancel,
        };

        if tier == AlertTier::Critical {
            tracing::warn!(score = gravity_score, generation, "Requesting SOS dispatch");
            outcome.events.push(AlertEvent::SosRequested {
                gravity_score,
                timestamp: now,
            });
        }
    }

    fn expire(&mut self, now: DateTime<Utc>, outcome: &mut Outcome) {
        let tier = self.state.tier;
        self.leave_to_normal(now);

        tracing::info!(tier = %tier, generation = self.state.generation, "Countdown elapsed, alert auto-dismissed");
        outcome.events.push(AlertEvent::Expired { tier, timestamp: now });
        outcome.timer = TimerCommand::Cancel;
    }

    fn leave_to_normal(&mut self, now: DateTime<Utc>) {
        self.state.generation += 1;
        self.state.tier = AlertTier::Normal;
        self.state.tier_entered_at = now;
        self.state.acknowledged = true;
        self.state.deadline = None;
        self.state.escalation_armed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 10, 9, 30, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(secs)
    }

    fn machine() -> AlertStateMachine {
        AlertStateMachine::new(AlertTimings::default(), t0())
    }

    fn still(score: f64) -> SampleInput {
        SampleInput { score, moving: false, acknowledge: false }
    }

    fn moving(score: f64) -> SampleInput {
        SampleInput { score, moving: true, acknowledge: false }
    }

    fn ack(score: f64) -> SampleInput {
        SampleInput { score, moving: false, acknowledge: true }
    }

    fn armed(outcome: &Outcome) -> TimerSpec {
        match outcome.timer {
            TimerCommand::Arm(spec) => spec,
            other => panic!("expected an armed timer, got {other:?}"),
        }
    }

    #[test]
    fn test_initial_state() {
        let m = machine();
        let state = m.state();
        assert_eq!(state.tier(), AlertTier::Normal);
        assert!(state.acknowledged());
        assert_eq!(state.cooldown_until(), None);
        assert_eq!(state.deadline(), None);
        assert_eq!(state.generation(), 0);
        assert_eq!(state.armed_timer(), None);
    }

    #[test]
    fn test_low_score_does_nothing() {
        let mut m = machine();
        let outcome = m.on_sample(still(0.29), at(1));
        assert!(outcome.is_empty());
        assert_eq!(m.state().tier(), AlertTier::Normal);
    }

    #[test]
    fn test_enter_pre_arms_auto_dismiss() {
        let mut m = machine();
        let outcome = m.on_sample(still(0.4), at(0));

        assert_eq!(outcome.entered(), Some(AlertTier::Pre));
        let spec = armed(&outcome);
        assert_eq!(spec.kind, TimerKind::AutoDismiss);
        assert_eq!(spec.deadline, at(30));
        assert_eq!(spec.generation, m.state().generation());
        assert!(!m.state().acknowledged());
        assert!(!outcome.sos_requested());
    }

    #[test]
    fn test_pre_expiry_auto_dismisses_without_cooldown() {
        let mut m = machine();
        let spec = armed(&m.on_sample(still(0.4), at(0)));

        let outcome = m.on_timer(spec.fired(), at(30)).unwrap();
        assert_eq!(outcome.events, vec![AlertEvent::Expired { tier: AlertTier::Pre, timestamp: at(30) }]);
        assert_eq!(outcome.timer, TimerCommand::Cancel);
        assert_eq!(m.state().tier(), AlertTier::Normal);
        assert_eq!(m.state().cooldown_until(), None);

        // Re-activates immediately
        let outcome = m.on_sample(still(0.4), at(31));
        assert_eq!(outcome.entered(), Some(AlertTier::Pre));
    }

    #[test]
    fn test_lower_score_never_demotes() {
        let mut m = machine();
        m.on_sample(still(0.7), at(0));
        let outcome = m.on_sample(still(0.0), at(1));
        assert!(outcome.is_empty());
        assert_eq!(m.state().tier(), AlertTier::Serious);
    }

    #[test]
    fn test_acknowledge_dismisses_with_cooldown() {
        let mut m = machine();
        m.on_sample(still(0.5), at(0));

        let outcome = m.on_sample(ack(0.1), at(3));
        assert_eq!(
            outcome.events,
            vec![AlertEvent::Dismissed {
                tier: AlertTier::Pre,
                cooldown_until: at(8),
                timestamp: at(3),
            }]
        );
        assert_eq!(outcome.timer, TimerCommand::Cancel);
        assert_eq!(m.state().tier(), AlertTier::Normal);
        assert!(m.state().acknowledged());
        assert_eq!(m.state().cooldown_until(), Some(at(8)));
    }

    #[test]
    fn test_cooldown_suppresses_then_releases() {
        let mut m = machine();
        m.on_sample(still(0.5), at(0));
        m.on_sample(ack(0.1), at(0));

        // dismiss + 2 s: computed, stored, not surfaced
        let outcome = m.on_sample(still(0.5), at(2));
        assert_eq!(outcome.entered(), None);
        assert_eq!(m.state().tier(), AlertTier::Normal);
        assert_eq!(m.state().suppressed_tier(), Some(AlertTier::Pre));
        assert!(matches!(
            outcome.events[0],
            AlertEvent::ActivationSuppressed { candidate: AlertTier::Pre, .. }
        ));
        assert_eq!(m.state().cooldown_remaining(at(2)), Some(Duration::seconds(3)));

        // dismiss + 6 s: surfaced
        let outcome = m.on_sample(still(0.5), at(6));
        assert_eq!(outcome.entered(), Some(AlertTier::Pre));
        assert_eq!(m.state().suppressed_tier(), None);
        assert_eq!(m.state().cooldown_until(), None);
    }

    #[test]
    fn test_oversized_cooldown_still_applies() {
        let timings = AlertTimings {
            cooldown_secs: u64::MAX,
            ..AlertTimings::default()
        };
        let mut m = AlertStateMachine::new(timings, t0());
        m.on_sample(still(0.5), at(0));
        m.on_sample(ack(0.1), at(1));

        assert!(m.state().in_cooldown(at(1)));
        assert_eq!(m.state().cooldown_until(), Some(at(1) + Duration::days(1)));
    }

    #[test]
    fn test_cooldown_suppresses_serious() {
        let mut m = machine();
        m.on_sample(still(0.7), at(0));
        m.on_sample(ack(0.7), at(1));

        let outcome = m.on_sample(still(0.7), at(3));
        assert_eq!(outcome.entered(), None);
        assert_eq!(m.state().suppressed_tier(), Some(AlertTier::Serious));
    }

    #[test]
    fn test_critical_exempt_from_cooldown() {
        let mut m = machine();
        m.on_sample(still(0.5), at(0));
        m.on_sample(ack(0.5), at(1));

        let outcome = m.on_sample(still(0.9), at(2));
        assert_eq!(outcome.entered(), Some(AlertTier::Critical));
        assert!(outcome.sos_requested());
    }

    #[test]
    fn test_acknowledge_before_activation() {
        let mut m = machine();
        m.on_sample(still(0.4), at(0));

        // Acknowledged in the same sample that would promote to Serious
        let outcome = m.on_sample(ack(0.65), at(5));
        assert_eq!(outcome.events[0].event_type(), "Dismissed");
        assert_eq!(outcome.events[1].event_type(), "ActivationSuppressed");
        assert_eq!(m.state().tier(), AlertTier::Normal);
        assert_eq!(m.state().suppressed_tier(), Some(AlertTier::Serious));
    }

    #[test]
    fn test_acknowledge_in_normal_is_silent() {
        let mut m = machine();
        assert!(m.on_sample(ack(0.0), at(0)).is_empty());
        assert_eq!(m.state().cooldown_until(), None);
    }

    #[test]
    fn test_pre_then_serious_not_critical() {
        let mut m = machine();
        let first = armed(&m.on_sample(still(0.4), at(0)));

        let outcome = m.on_sample(still(0.65), at(10));
        assert_eq!(outcome.entered(), Some(AlertTier::Serious));
        assert!(!outcome.sos_requested());
        let spec = armed(&outcome);
        assert_eq!(spec.kind, TimerKind::Escalation);
        assert_eq!(spec.deadline, at(20));
        assert!(m.state().escalation_armed());

        // The Pre countdown is now stale
        assert!(m.on_timer(first.fired(), at(30)).unwrap().is_empty());
        assert_eq!(m.state().tier(), AlertTier::Serious);
    }

    #[test]
    fn test_serious_escalates_when_immobile() {
        let mut m = machine();
        let spec = armed(&m.on_sample(still(0.75), at(0)));

        let outcome = m.on_timer(spec.fired(), at(10)).unwrap();
        assert_eq!(outcome.entered(), Some(AlertTier::Critical));
        assert!(matches!(
            outcome.events[0],
            AlertEvent::TierEntered { cause: EntryCause::Escalation, previous: AlertTier::Serious, .. }
        ));
        let sos_count = outcome
            .events
            .iter()
            .filter(|e| matches!(e, AlertEvent::SosRequested { .. }))
            .count();
        assert_eq!(sos_count, 1);
        assert_eq!(outcome.timer, TimerCommand::Cancel);

        // Later samples never request another SOS
        for i in 0..20 {
            let outcome = m.on_sample(still(0.95), at(11 + i));
            assert!(!outcome.sos_requested());
        }
    }

    #[test]
    fn test_movement_disarms_escalation() {
        let mut m = machine();
        let spec = armed(&m.on_sample(still(0.75), at(0)));

        let outcome = m.on_sample(moving(0.75), at(4));
        assert_eq!(outcome.events, vec![AlertEvent::EscalationDisarmed { timestamp: at(4) }]);
        assert_eq!(outcome.timer, TimerCommand::Keep);
        assert!(!m.state().escalation_armed());

        // Stopping again does not re-arm
        m.on_sample(still(0.75), at(6));
        assert!(!m.state().escalation_armed());

        let outcome = m.on_timer(spec.fired(), at(10)).unwrap();
        assert_eq!(outcome.events, vec![AlertEvent::Expired { tier: AlertTier::Serious, timestamp: at(10) }]);
        assert_eq!(m.state().tier(), AlertTier::Normal);
    }

    #[test]
    fn test_serious_entered_while_moving_is_not_armed() {
        let mut m = machine();
        let spec = armed(&m.on_sample(moving(0.7), at(0)));
        assert!(!m.state().escalation_armed());

        let outcome = m.on_timer(spec.fired(), at(10)).unwrap();
        assert_eq!(outcome.entered(), None);
        assert_eq!(m.state().tier(), AlertTier::Normal);
    }

    #[test]
    fn test_critical_ignores_acknowledgment() {
        let mut m = machine();
        m.on_sample(still(0.9), at(0));

        let outcome = m.on_sample(ack(0.9), at(1));
        assert_eq!(
            outcome.events,
            vec![AlertEvent::AcknowledgeIgnored { tier: AlertTier::Critical, timestamp: at(1) }]
        );
        assert_eq!(m.state().tier(), AlertTier::Critical);
        assert_eq!(m.state().cooldown_until(), None);
    }

    #[test]
    fn test_critical_never_auto_dismisses() {
        let mut m = machine();
        let pre = armed(&m.on_sample(still(0.4), at(0)));
        let serious = armed(&m.on_sample(still(0.7), at(1)));
        m.on_sample(still(0.85), at(2));
        assert_eq!(m.state().tier(), AlertTier::Critical);

        // Deterministic pseudo-random score sequence with acknowledgments
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for i in 0..500 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let score = (seed >> 11) as f64 / (1u64 << 53) as f64;
            let input = SampleInput {
                score,
                moving: i % 3 == 0,
                acknowledge: i % 7 == 0,
            };
            m.on_sample(input, at(3 + i));
            assert_eq!(m.state().tier(), AlertTier::Critical);
        }

        // Timers from earlier tiers are stale
        assert!(m.on_timer(pre.fired(), at(600)).unwrap().is_empty());
        assert!(m.on_timer(serious.fired(), at(600)).unwrap().is_empty());
        assert_eq!(m.state().tier(), AlertTier::Critical);
        assert_eq!(m.state().countdown_remaining(at(600)), None);
    }

    #[test]
    fn test_reset_clears_critical_only() {
        let mut m = machine();
        m.on_sample(still(0.4), at(0));
        assert!(m.reset("operator", at(1)).is_empty());
        assert_eq!(m.state().tier(), AlertTier::Pre);

        m.on_sample(still(0.9), at(2));
        let outcome = m.reset("operator", at(3));
        assert_eq!(
            outcome.events,
            vec![AlertEvent::Reset {
                previous: AlertTier::Critical,
                by: "operator".into(),
                timestamp: at(3),
            }]
        );
        assert_eq!(m.state().tier(), AlertTier::Normal);
        assert!(m.state().acknowledged());

        // A reset is not an acknowledgment: no cooldown
        assert_eq!(m.on_sample(still(0.4), at(4)).entered(), Some(AlertTier::Pre));
    }

    #[test]
    fn test_future_generation_is_invariant_violation() {
        let mut m = machine();
        m.on_sample(still(0.4), at(0));
        let fired = TimerFired {
            generation: m.state().generation() + 1,
            kind: TimerKind::AutoDismiss,
        };
        let err = m.on_timer(fired, at(30)).unwrap_err();
        assert!(matches!(err, AlertingError::InvariantViolation(_)));
    }

    #[test]
    fn test_kind_mismatch_is_invariant_violation() {
        let mut m = machine();
        m.on_sample(still(0.4), at(0));
        let fired = TimerFired {
            generation: m.state().generation(),
            kind: TimerKind::Escalation,
        };
        assert!(m.on_timer(fired, at(30)).is_err());

        let mut m = machine();
        m.on_sample(still(0.9), at(0));
        let fired = TimerFired {
            generation: m.state().generation(),
            kind: TimerKind::AutoDismiss,
        };
        assert!(m.on_timer(fired, at(30)).is_err());
        assert_eq!(m.state().tier(), AlertTier::Critical);
    }

    #[test]
    fn test_deterministic() {
        let inputs = [still(0.4), ack(0.4), still(0.5), moving(0.7), still(0.9), ack(0.0)];
        let mut a = machine();
        let mut b = machine();
        for (i, input) in inputs.iter().enumerate() {
            let now = at(i as i64 * 2);
            assert_eq!(a.on_sample(*input, now), b.on_sample(*input, now));
            assert_eq!(a.state(), b.state());
        }
    }

    #[test]
    fn test_countdown_remaining() {
        let mut m = machine();
        m.on_sample(still(0.7), at(0));
        assert_eq!(m.state().countdown_remaining(at(4)), Some(Duration::seconds(6)));
        assert_eq!(m.state().countdown_remaining(at(15)), Some(Duration::zero()));
        assert_eq!(m.state().cooldown_remaining(at(4)), None);
    }
}
