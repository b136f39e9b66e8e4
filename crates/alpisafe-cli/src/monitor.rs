//! Monitor CLI Subcommands
//!
//! This module provides CLI commands for working with the wearer monitor:
//! - Replay of recorded telemetry through the full alert pipeline
//! - One-off scoring of a set of vitals
//! - Configuration output and checking

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use clap::{Args, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use tokio::io::AsyncReadExt;
use tokio::sync::broadcast::error::RecvError;

use alpisafe_monitor::assessment::composer::weights;
use alpisafe_monitor::{
    assess, Alert, AlertDispatcher, AlertEvent, AlertStatus, AlertTier, Assessment,
    ChannelSosHandler, LoggingAlertHandler, MonitorConfig, MonitorService, MonitorUpdate,
    RawSample, ReadingValidator, SosRequest, TokioClock,
};

/// Arguments for the replay command
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines file of samples, or `-` for stdin
    pub input: PathBuf,

    /// Monitor configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Wait out the gaps between sample timestamps on the wall clock.
    /// Without this flag the replay runs instantly on recorded time.
    #[arg(short, long)]
    pub realtime: bool,

    /// Keep running this many seconds after the last sample. On recorded
    /// time pending countdowns always run out.
    #[arg(short, long, default_value = "0")]
    pub settle_secs: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the score command
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Heart rate (bpm)
    #[arg(long)]
    pub bpm: f64,

    /// Core temperature (°C)
    #[arg(long, allow_negative_numbers = true)]
    pub core: f64,

    /// Ambient temperature (°C)
    #[arg(long, allow_negative_numbers = true)]
    pub ambient: f64,

    /// Minutes without movement
    #[arg(long, default_value = "0")]
    pub immobile_minutes: f64,

    /// The wearer is moving
    #[arg(long)]
    pub moving: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the default configuration, or write it to a file
    Default {
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load and validate a configuration file
    Check {
        /// Configuration file (JSON)
        path: PathBuf,
    },
}

/// Output format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Coloured human-readable output
    Table,
    /// One JSON document per line
    Json,
    /// Terse key=value lines
    Compact,
}

// ============================================================================
// Display Structs for Tables
// ============================================================================

/// Subscore display row
#[derive(Tabled)]
struct SubscoreRow {
    #[tabled(rename = "Subscore")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Contribution")]
    contribution: String,
}

/// Alert display row
#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Raised")]
    raised: String,
    #[tabled(rename = "Resolution")]
    resolution: String,
}

/// Configuration display row
#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// How samples are spaced in time during a replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pacing {
    /// Sleep on the wall clock for each timestamp gap
    Realtime,
    /// Paused tokio time, advanced by each timestamp gap
    Recorded,
}

/// What a replay left behind
struct ReplaySummary {
    alerts: Vec<Alert>,
    updates: usize,
    sos_count: usize,
}

/// JSON output of the score command
#[derive(Serialize)]
struct ScoreReport<'a> {
    tier: AlertTier,
    #[serde(flatten)]
    assessment: &'a Assessment,
}

// ============================================================================
// Command Execution
// ============================================================================

/// Execute the replay command
pub async fn execute_replay(args: ReplayArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => MonitorConfig::from_json(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => MonitorConfig::default(),
    };

    let samples = read_samples(&args.input).await?;
    if samples.is_empty() {
        anyhow::bail!("No samples found in {}", args.input.display());
    }

    let format = args.format;
    if format == OutputFormat::Table {
        println!(
            "{} Replaying {} samples from {}",
            "[ALPISAFE]".bright_cyan().bold(),
            samples.len(),
            args.input.display()
        );
    }

    let pacing = if args.realtime { Pacing::Realtime } else { Pacing::Recorded };
    let summary = replay(
        config,
        samples,
        pacing,
        Duration::from_secs(args.settle_secs),
        move |update| print_update(update, format),
        move |request| {
            if format == OutputFormat::Table {
                print_sos(request);
            }
        },
    )
    .await?;

    match format {
        OutputFormat::Table => {
            print_replay_summary(&summary.alerts, summary.updates, summary.sos_count)
        }
        OutputFormat::Compact => println!(
            "updates={} alerts={} sos={}",
            summary.updates,
            summary.alerts.len(),
            summary.sos_count
        ),
        OutputFormat::Json => {}
    }

    Ok(())
}

/// Run samples through a monitor, reporting every update and SOS request.
///
/// The monitor clock starts at the first sample's timestamp. With
/// [`Pacing::Recorded`] tokio time is paused for the rest of the runtime's
/// life, so this must run on a current-thread runtime.
async fn replay<U, S>(
    config: MonitorConfig,
    samples: Vec<RawSample>,
    pacing: Pacing,
    settle: Duration,
    mut on_update: U,
    mut on_sos: S,
) -> Result<ReplaySummary>
where
    U: FnMut(&MonitorUpdate) -> Result<()> + Send + 'static,
    S: FnMut(&SosRequest) + Send + 'static,
{
    let longest_countdown = Duration::from_secs(
        config
            .timings
            .pre_countdown_secs
            .max(config.timings.serious_countdown_secs),
    );
    let settle = match pacing {
        Pacing::Realtime => settle,
        Pacing::Recorded => {
            tokio::time::pause();
            settle.max(longest_countdown)
        }
    };

    let origin = samples
        .iter()
        .find_map(sample_timestamp)
        .and_then(|ts| Utc.timestamp_opt(ts as i64, 0).single())
        .unwrap_or_else(Utc::now);

    let (sos_handler, mut sos_rx) = ChannelSosHandler::channel(16);
    let mut dispatcher = AlertDispatcher::new();
    dispatcher.add_handler(Box::new(LoggingAlertHandler));
    dispatcher.add_sos_handler(Box::new(sos_handler));

    let (service, handle) =
        MonitorService::with_clock(config, dispatcher, TokioClock::starting_at(origin))?;
    let mut updates = handle.subscribe();
    let service_task = tokio::spawn(service.run());

    let printer = tokio::spawn(async move {
        let mut printed = 0usize;
        loop {
            match updates.recv().await {
                Ok(update) => {
                    on_update(&update)?;
                    printed += 1;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Output fell behind, updates dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        Ok::<usize, anyhow::Error>(printed)
    });
    let sos_printer = tokio::spawn(async move {
        while let Some(request) = sos_rx.recv().await {
            on_sos(&request);
        }
    });

    // On paused time each sleep lets due countdowns fire before the next sample
    let mut previous = None;
    for sample in samples {
        let current = sample_timestamp(&sample);
        if let Some(gap) = pacing_gap(previous, current) {
            tokio::time::sleep(gap).await;
        }
        previous = current.or(previous);
        handle.submit(sample).await?;
    }

    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }

    handle.shutdown().await?;
    service_task.await.context("Monitor task panicked")??;

    let dispatcher = handle.dispatcher();
    let mut alerts = dispatcher.history();
    alerts.extend(dispatcher.active());
    let sos_count = dispatcher.sos_count();
    drop(handle);

    let updates = printer.await.context("Output task panicked")??;
    sos_printer.await.context("SOS output task panicked")?;

    Ok(ReplaySummary {
        alerts,
        updates,
        sos_count,
    })
}

/// Execute the score command
pub fn execute_score(args: ScoreArgs) -> Result<()> {
    let immobile_secs = if args.moving { 0.0 } else { args.immobile_minutes.max(0.0) * 60.0 };
    let raw = RawSample::new()
        .with("BPM", args.bpm.to_string())
        .with("InternalTemperature", args.core.to_string())
        .with("ExternalTemperature", args.ambient.to_string())
        .with("movement", if args.moving { "1" } else { "0" })
        .with("tempsDimmobilite", immobile_secs.to_string())
        .with("timestamp", Utc::now().timestamp().to_string());

    let validated = ReadingValidator::default()
        .validate(&raw)
        .context("Reading rejected")?;
    for issue in &validated.report.issues {
        eprintln!("{} {}", "[WARN]".yellow(), issue);
    }

    let assessment = assess(&validated.reading);
    let tier = assessment.candidate_tier();

    match args.format {
        OutputFormat::Json => {
            let report = ScoreReport {
                tier,
                assessment: &assessment,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Compact => {
            println!(
                "score={} tier={} category={} narrative=\"{}\"",
                assessment.gravity, tier, assessment.narrative.category, assessment.narrative.label
            );
        }
        OutputFormat::Table => {
            let table = Table::new(subscore_rows(&assessment))
                .with(Style::rounded())
                .to_string();
            println!("{table}");
            println!(
                "  {} {}  {}",
                "Gravity score:".dimmed(),
                assessment.gravity.to_string().bold(),
                format_tier(tier)
            );
            println!(
                "  {} {} ({})",
                "Condition:".dimmed(),
                assessment.narrative.label,
                assessment.narrative.category
            );
        }
    }

    Ok(())
}

/// Execute a config command
pub fn execute_config(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Default { output: Some(path) } => {
            MonitorConfig::default()
                .to_json(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Default configuration written to {}",
                "[OK]".green(),
                path.display()
            );
        }
        ConfigCommand::Default { output: None } => {
            println!("{}", MonitorConfig::default().to_json_string()?);
        }
        ConfigCommand::Check { path } => {
            let config = MonitorConfig::from_json(&path)
                .with_context(|| format!("Invalid configuration {}", path.display()))?;
            println!("{} {} is valid", "[OK]".green(), path.display());
            let table = Table::new(setting_rows(&config))
                .with(Style::rounded())
                .to_string();
            println!("{table}");
        }
    }
    Ok(())
}

// ============================================================================
// Input
// ============================================================================

async fn read_samples(input: &Path) -> Result<Vec<RawSample>> {
    let text = if input == Path::new("-") {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read samples from stdin")?;
        text
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))?
    };
    Ok(parse_samples(&text))
}

/// Parse JSON-lines samples, skipping blank and unparseable lines
fn parse_samples(text: &str) -> Vec<RawSample> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| match serde_json::from_str::<RawSample>(line) {
            Ok(sample) => Some(sample),
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "Skipping unparseable sample");
                None
            }
        })
        .collect()
}

fn sample_timestamp(sample: &RawSample) -> Option<f64> {
    sample
        .timestamp
        .as_deref()
        .and_then(|ts| ts.trim().parse::<f64>().ok())
        .filter(|ts| ts.is_finite())
}

/// Wait between two samples; none for a missing, non-advancing or
/// unrepresentable gap
fn pacing_gap(previous: Option<f64>, current: Option<f64>) -> Option<Duration> {
    match (previous, current) {
        (Some(previous), Some(current)) if current > previous => {
            Duration::try_from_secs_f64(current - previous).ok()
        }
        _ => None,
    }
}

// ============================================================================
// Output
// ============================================================================

fn print_update(update: &MonitorUpdate, format: OutputFormat) -> Result<()> {
    let status = &update.status;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(update)?),
        OutputFormat::Compact => println!(
            "time={} tier={} score={:.2} immobile_min={:.1} narrative=\"{}\"",
            status.sample_time.to_rfc3339(),
            status.tier(),
            status.score,
            status.immobile_minutes,
            status.condition.narrative
        ),
        OutputFormat::Table => {
            println!(
                "{} {} {:.2} | {} | still {:.0} min",
                format!("[{}]", status.sample_time.format("%H:%M:%S")).dimmed(),
                format_tier(status.tier()),
                status.score,
                status.condition.narrative,
                status.immobile_minutes
            );
            if !status.stale.is_empty() {
                let stale: Vec<String> = status.stale.iter().map(ToString::to_string).collect();
                println!("           {} {}", "stale:".dimmed(), stale.join(", ").yellow());
            }
            for event in &update.events {
                println!("           {} {}", "->".dimmed(), describe_event(event));
            }
        }
    }
    Ok(())
}

fn print_sos(request: &SosRequest) {
    let position = match (request.latitude_deg, request.longitude_deg) {
        (Some(lat), Some(lon)) => format!("{lat:.5}, {lon:.5}"),
        _ => "no GPS fix".to_string(),
    };
    println!(
        "{} score {:.2} | {} | {}",
        "[SOS]".on_red().white().bold(),
        request.gravity_score,
        request.narrative,
        position
    );
}

fn print_replay_summary(alerts: &[Alert], updates: usize, sos_count: usize) {
    println!();
    println!("{}", "Replay Summary".bold().cyan());
    println!("{}", "=".repeat(50));
    println!("  {} {}", "Updates:".dimmed(), updates);
    println!(
        "  {} {}",
        "SOS dispatched:".dimmed(),
        if sos_count > 0 {
            sos_count.to_string().red().bold()
        } else {
            sos_count.to_string().normal()
        }
    );

    if alerts.is_empty() {
        println!("  {} No alerts raised", "[INFO]".blue());
        return;
    }

    let rows: Vec<AlertRow> = alerts.iter().map(alert_row).collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn describe_event(event: &AlertEvent) -> String {
    match event {
        AlertEvent::TierEntered { tier, previous, deadline, .. } => {
            let countdown = deadline
                .map(|d| format!(" until {}", d.format("%H:%M:%S")))
                .unwrap_or_default();
            format!("{} -> {}{}", previous, format_tier(*tier), countdown)
        }
        AlertEvent::Dismissed { tier, cooldown_until, .. } => format!(
            "{} dismissed, cooldown until {}",
            tier,
            cooldown_until.format("%H:%M:%S")
        ),
        AlertEvent::Expired { tier, .. } => format!("{tier} countdown elapsed"),
        AlertEvent::ActivationSuppressed { candidate, .. } => {
            format!("{} held back by cooldown", candidate).dimmed().to_string()
        }
        AlertEvent::EscalationDisarmed { .. } => "movement resumed, escalation disarmed".to_string(),
        AlertEvent::AcknowledgeIgnored { tier, .. } => {
            format!("acknowledgment ignored in {tier}").dimmed().to_string()
        }
        AlertEvent::SosRequested { .. } => "SOS requested".red().bold().to_string(),
        AlertEvent::Reset { by, .. } => format!("reset by {by}"),
    }
}

fn subscore_rows(assessment: &Assessment) -> Vec<SubscoreRow> {
    const NAMES: [&str; 4] = [
        "Cardiac-thermal",
        "Immobility",
        "Environmental-thermal",
        "Medical interaction",
    ];

    NAMES
        .into_iter()
        .zip(assessment.subscores.as_array())
        .zip(weights())
        .map(|((name, value), weight)| SubscoreRow {
            name,
            value: format!("{value:.2}"),
            weight: format!("{weight:.2}"),
            contribution: format!("{:.3}", value * weight),
        })
        .collect()
}

fn setting_rows(config: &MonitorConfig) -> Vec<SettingRow> {
    let bound = |b: &alpisafe_monitor::Bound| format!("{} .. {}", b.min, b.max);
    vec![
        SettingRow { name: "Pre countdown (s)", value: config.timings.pre_countdown_secs.to_string() },
        SettingRow { name: "Serious countdown (s)", value: config.timings.serious_countdown_secs.to_string() },
        SettingRow { name: "Cooldown (s)", value: config.timings.cooldown_secs.to_string() },
        SettingRow { name: "Heart rate (bpm)", value: bound(&config.bounds.heart_rate_bpm) },
        SettingRow { name: "Core temperature (°C)", value: bound(&config.bounds.internal_temp_c) },
        SettingRow { name: "Ambient temperature (°C)", value: bound(&config.bounds.external_temp_c) },
        SettingRow { name: "Queue capacity", value: config.queue_capacity.to_string() },
        SettingRow { name: "Broadcast capacity", value: config.broadcast_capacity.to_string() },
    ]
}

fn alert_row(alert: &Alert) -> AlertRow {
    let id = alert.id().to_string();
    AlertRow {
        id: id.chars().take(8).collect(),
        tier: format_tier(alert.tier()),
        status: format_alert_status(alert.status()),
        raised: format_time(alert.created_at()),
        resolution: alert
            .resolution()
            .map(|r| format!("{:?}", r.resolution_type))
            .unwrap_or_else(|| "-".to_string()),
    }
}

// ============================================================================
// Formatting Helpers
// ============================================================================

/// Format a tier with its display colour
fn format_tier(tier: AlertTier) -> String {
    let label = tier.to_string();
    match tier {
        AlertTier::Normal => label.green().to_string(),
        AlertTier::Pre => label.yellow().bold().to_string(),
        AlertTier::Serious => label.truecolor(255, 140, 0).bold().to_string(),
        AlertTier::Critical => label.red().bold().to_string(),
    }
}

/// Format alert status with color
fn format_alert_status(status: AlertStatus) -> String {
    match status {
        AlertStatus::Active => "Active".red().to_string(),
        AlertStatus::Acknowledged => "Acknowledged".yellow().to_string(),
        AlertStatus::Resolved => "Resolved".green().to_string(),
    }
}

fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_parse_samples_skips_bad_lines() {
        let text = r#"{"BPM":"72","InternalTemperature":"36.5","timestamp":"1700000000"}

not json
{"heartRate":64,"movement":1,"timestamp":1700000005}
"#;
        let samples = parse_samples(text);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].bpm.as_deref(), Some("72"));
        assert_eq!(samples[1].bpm.as_deref(), Some("64"));
    }

    #[test]
    fn test_pacing_gap() {
        assert_eq!(pacing_gap(Some(10.0), Some(15.0)), Some(Duration::from_secs(5)));
        assert_eq!(pacing_gap(Some(10.0), Some(10.0)), None);
        assert_eq!(pacing_gap(Some(10.0), Some(8.0)), None);
        assert_eq!(pacing_gap(None, Some(8.0)), None);
        assert_eq!(pacing_gap(Some(10.0), None), None);
        assert_eq!(pacing_gap(Some(0.0), Some(1e25)), None);
    }

    fn pre_sample(ts: i64, pressed: bool) -> String {
        format!(
            r#"{{"BPM":"90","InternalTemperature":"36.8","ExternalTemperature":"-8","movement":"0","tempsDimmobilite":"{}","ButtonState":"{}","timestamp":"{}"}}"#,
            1260 + (ts - 1_700_000_000),
            u8::from(pressed),
            ts
        )
    }

    fn entered_tiers(sink: Arc<Mutex<Vec<AlertTier>>>) -> impl FnMut(&MonitorUpdate) -> Result<()> {
        move |update| {
            let mut tiers = sink.lock().unwrap();
            tiers.extend(update.events.iter().filter_map(|event| match event {
                AlertEvent::TierEntered { tier, .. } => Some(*tier),
                _ => None,
            }));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_replay_cooldown_follows_recorded_time() {
        let t0 = 1_700_000_000;
        let text = [pre_sample(t0, false), pre_sample(t0 + 1, true), pre_sample(t0 + 7, false)]
            .join("\n");

        let tiers = Arc::new(Mutex::new(Vec::new()));
        let summary = replay(
            MonitorConfig::default(),
            parse_samples(&text),
            Pacing::Recorded,
            Duration::ZERO,
            entered_tiers(Arc::clone(&tiers)),
            |_| {},
        )
        .await
        .unwrap();

        // Re-activation six seconds after the dismiss is not held back
        assert_eq!(*tiers.lock().unwrap(), vec![AlertTier::Pre, AlertTier::Pre]);
        assert_eq!(summary.sos_count, 0);
        assert_eq!(summary.alerts.len(), 2);
    }

    #[tokio::test]
    async fn test_replay_escalates_between_samples() {
        let serious = |ts: i64| {
            format!(
                r#"{{"BPM":"45","InternalTemperature":"34","ExternalTemperature":"-12","movement":"0","tempsDimmobilite":"960","timestamp":"{ts}"}}"#
            )
        };
        let text = [serious(1_700_000_000), serious(1_700_000_012)].join("\n");

        let tiers = Arc::new(Mutex::new(Vec::new()));
        let sos = Arc::new(Mutex::new(0usize));
        let sos_sink = Arc::clone(&sos);
        let summary = replay(
            MonitorConfig::default(),
            parse_samples(&text),
            Pacing::Recorded,
            Duration::ZERO,
            entered_tiers(Arc::clone(&tiers)),
            move |_| *sos_sink.lock().unwrap() += 1,
        )
        .await
        .unwrap();

        assert_eq!(*tiers.lock().unwrap(), vec![AlertTier::Serious, AlertTier::Critical]);
        assert_eq!(summary.sos_count, 1);
        assert_eq!(*sos.lock().unwrap(), 1);
        assert_eq!(summary.updates, 3);
    }

    #[test]
    fn test_sample_timestamp() {
        let sample = RawSample::new().with("timestamp", " 1700000000 ");
        assert_eq!(sample_timestamp(&sample), Some(1_700_000_000.0));
        assert_eq!(sample_timestamp(&RawSample::new().with("timestamp", "soon")), None);
        assert_eq!(sample_timestamp(&RawSample::new()), None);
    }

    #[test]
    fn test_subscore_rows_scenario() {
        let raw = RawSample::new()
            .with("BPM", "38")
            .with("InternalTemperature", "29.5")
            .with("ExternalTemperature", "-18")
            .with("movement", "0")
            .with("tempsDimmobilite", "1200")
            .with("timestamp", "1700000000");
        let validated = ReadingValidator::default().validate(&raw).unwrap();
        let rows = subscore_rows(&assess(&validated.reading));

        let values: Vec<&str> = rows.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["1.00", "0.50", "1.00", "0.50"]);
        assert_eq!(rows[0].contribution, "0.300");
    }

    #[test]
    fn test_describe_every_event() {
        let now = Utc::now();
        let event = AlertEvent::Reset {
            previous: AlertTier::Critical,
            by: "rescue team".into(),
            timestamp: now,
        };
        assert_eq!(describe_event(&event), "reset by rescue team");
        let event = AlertEvent::Expired { tier: AlertTier::Pre, timestamp: now };
        assert_eq!(describe_event(&event), "PRE-ALERT countdown elapsed");
    }

    #[test]
    fn test_config_default_then_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.json");

        execute_config(ConfigCommand::Default { output: Some(path.clone()) }).unwrap();
        assert!(path.exists());
        execute_config(ConfigCommand::Check { path }).unwrap();
    }

    #[test]
    fn test_config_check_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"timings":{"cooldown_secs":0}}"#).unwrap();
        assert!(execute_config(ConfigCommand::Check { path }).is_err());
    }

    #[test]
    fn test_score_command_runs() {
        let args = ScoreArgs {
            bpm: 58.0,
            core: 35.2,
            ambient: -12.0,
            immobile_minutes: 0.0,
            moving: true,
            format: OutputFormat::Compact,
        };
        assert!(execute_score(args).is_ok());
    }
}
