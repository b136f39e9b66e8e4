//! Alert generation from tier entries.

use chrono::{DateTime, Utc};

use super::AlertingError;
use crate::assessment::AssessedReading;
use crate::config::AlertTimings;
use crate::domain::{Alert, AlertPayload, AlertTier, SosRequest};

/// Builds alerts and SOS requests from the latest assessed reading
#[derive(Debug, Clone, Default)]
pub struct AlertGenerator {
    timings: AlertTimings,
}

impl AlertGenerator {
    /// Create a generator using the given countdowns for presentation text
    pub fn new(timings: AlertTimings) -> Self {
        Self { timings }
    }

    /// Generate the alert shown when `tier` is entered.
    ///
    /// `latest` is the most recent assessed reading; it is absent only when a
    /// tier is entered before any sample was accepted.
    pub fn generate(
        &self,
        tier: AlertTier,
        latest: Option<&AssessedReading>,
        gravity_score: f64,
        deadline: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Alert, AlertingError> {
        if !tier.is_alerting() {
            return Err(AlertingError::NotAlertable(tier));
        }

        let mut payload = self.create_payload(tier, latest, gravity_score);
        if let Some(deadline) = deadline {
            payload = payload.with_deadline(deadline);
        }
        Ok(Alert::new(tier, payload, now))
    }

    /// Build the SOS request for a Critical alert
    pub fn sos_request(
        &self,
        alert: &Alert,
        latest: Option<&AssessedReading>,
        now: DateTime<Utc>,
    ) -> SosRequest {
        let fix = latest
            .map(|assessed| &assessed.reading)
            .filter(|reading| reading.has_fix());

        SosRequest {
            alert_id: alert.id().clone(),
            gravity_score: alert.payload().gravity_score,
            narrative: alert.payload().narrative.clone(),
            latitude_deg: fix.map(|r| r.latitude_deg),
            longitude_deg: fix.map(|r| r.longitude_deg),
            altitude_m: latest.map(|assessed| assessed.reading.altitude_m),
            requested_at: now,
        }
    }

    fn create_payload(
        &self,
        tier: AlertTier,
        latest: Option<&AssessedReading>,
        gravity_score: f64,
    ) -> AlertPayload {
        let presentation = tier.presentation(&self.timings);
        let narrative = latest
            .map(|assessed| assessed.assessment.narrative.label.clone())
            .unwrap_or_else(|| "No recent reading".to_string());

        let countdown = match presentation.countdown_secs {
            Some(secs) => format!("{secs} seconds to respond"),
            None => "No countdown".to_string(),
        };

        let message = format!(
            "{}\n\
             Condition: {}\n\
             Gravity score: {:.2}\n\
             {}\n\n\
             Vital Signs:\n{}\n\n\
             Location:\n{}",
            presentation.description,
            narrative,
            gravity_score,
            countdown,
            self.format_vitals(latest),
            self.format_location(latest),
        );

        let mut payload = AlertPayload::new(presentation.title, message, gravity_score)
            .with_narrative(narrative)
            .with_action(self.recommend_action(tier))
            .with_metadata("tier", tier.to_string())
            .with_metadata("score", format!("{gravity_score:.2}"))
            .with_metadata("dismissible", presentation.dismissible.to_string());

        if let Some(assessed) = latest {
            let reading = &assessed.reading;
            payload = payload
                .with_metadata("category", assessed.assessment.narrative.category.to_string())
                .with_metadata("sample_time", reading.sample_time_unix.to_string());
            if reading.has_fix() {
                payload = payload
                    .with_metadata("latitude", format!("{:.5}", reading.latitude_deg))
                    .with_metadata("longitude", format!("{:.5}", reading.longitude_deg));
            }
        }

        payload
    }

    fn format_vitals(&self, latest: Option<&AssessedReading>) -> String {
        let Some(assessed) = latest else {
            return "  No recent readings".to_string();
        };
        let reading = &assessed.reading;
        let subscores = &assessed.assessment.subscores;

        let mut lines = vec![
            format!("  Heart rate: {:.0} bpm", reading.heart_rate_bpm),
            format!("  Core temperature: {:.1} °C", reading.internal_temp_c),
            format!("  Ambient temperature: {:.1} °C", reading.external_temp_c),
        ];

        if reading.movement {
            lines.push("  Movement: yes".to_string());
        } else {
            lines.push(format!("  Movement: none for {:.0} min", reading.immobile_minutes()));
        }

        lines.push(format!(
            "  Subscores: cardiac {:.1}, immobility {:.1}, environment {:.1}, medical {:.1}",
            subscores.cardiac_thermal,
            subscores.immobility,
            subscores.environmental_thermal,
            subscores.medical_interaction,
        ));

        if assessed.report.is_stale() {
            let stale: Vec<_> = assessed.report.stale_fields.iter().map(|f| f.wire_name()).collect();
            lines.push(format!("  Stale fields: {}", stale.join(", ")));
        }

        lines.join("\n")
    }

    fn format_location(&self, latest: Option<&AssessedReading>) -> String {
        match latest.map(|assessed| &assessed.reading) {
            Some(reading) if reading.has_fix() => format!(
                "  GPS: {:.5}, {:.5}\n  Altitude: {:.0} m",
                reading.latitude_deg, reading.longitude_deg, reading.altitude_m
            ),
            Some(reading) => format!("  GPS: no fix\n  Altitude: {:.0} m", reading.altitude_m),
            None => "  Location unknown".to_string(),
        }
    }

    fn recommend_action(&self, tier: AlertTier) -> &'static str {
        match tier {
            AlertTier::Critical => "SOS sent. Keep the wearer warm and still; emergency services are being alerted.",
            AlertTier::Serious => "Acknowledge if safe. Otherwise an SOS is sent when the countdown ends.",
            AlertTier::Pre => "Check on the wearer; add insulation and keep moving if possible.",
            AlertTier::Normal => "No action required.",
        }
    }
}
