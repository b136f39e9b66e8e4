//! AlpiSafe CLI
//!
//! Command-line front end for the AlpiSafe wearer monitor.
//!
//! # Features
//!
//! - **replay**: run recorded JSON-lines telemetry through the full monitor
//! - **score**: score a single set of vitals
//! - **config**: print or check a monitor configuration
//! - **version**: display version information
//!
//! # Usage
//!
//! ```bash
//! # Replay a recording at its original pace
//! alpisafe replay recordings/col-du-midi.jsonl --realtime
//!
//! # Score one reading
//! alpisafe score --bpm 38 --core 29.5 --ambient -18 --immobile-minutes 20
//!
//! # Write the default configuration
//! alpisafe config default --output monitor.json
//! ```

use clap::{Parser, Subcommand};

pub mod monitor;

/// AlpiSafe Command Line Interface
#[derive(Parser, Debug)]
#[command(name = "alpisafe")]
#[command(author, version, about = "Wearable mountaineering telemetry monitor")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay recorded samples through the monitor
    Replay(monitor::ReplayArgs),

    /// Score a single reading
    Score(monitor::ScoreArgs),

    /// Inspect monitor configuration
    #[command(subcommand)]
    Config(monitor::ConfigCommand),

    /// Display version information
    Version,
}
