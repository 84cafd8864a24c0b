use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seatplan_cli::args::Cli;
use seatplan_cli::config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // --- Configuration ---
    let config = AppConfig::from_env()?.with_overrides(cli.data, cli.seed);

    // --- Tracing ---
    init_tracing(config.log_format);
    tracing::debug!(data = %config.data_path.display(), seed = ?config.seed, "Loaded configuration");

    let output = seatplan_cli::run(cli.command, &config)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}
