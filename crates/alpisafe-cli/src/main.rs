//! AlpiSafe CLI Entry Point

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use alpisafe_cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay(args) => alpisafe_cli::monitor::execute_replay(args).await?,
        Commands::Score(args) => alpisafe_cli::monitor::execute_score(args)?,
        Commands::Config(cmd) => alpisafe_cli::monitor::execute_config(cmd)?,
        Commands::Version => {
            println!("alpisafe {}", env!("CARGO_PKG_VERSION"));
            println!("monitor library version: {}", alpisafe_monitor::VERSION);
        }
    }

    Ok(())
}
