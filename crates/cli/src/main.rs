//! # Stream Recorder CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Recording with guaranteed ledger flush on interruption
//! - Playback preparation and external encoding
//! - Configuration validation and ledger inspection

mod cli;
mod commands;
mod error;
mod recorder;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_encode, run_info, run_prepare, run_record, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = observability::ObservabilityConfig {
        log_format: cli.log_format.into(),
        ..Default::default()
    }
    .with_verbosity(cli.verbose, cli.quiet);
    observability::init_with_config(config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Stream Recorder CLI starting"
    );

    // Execute command
    let result = match &cli.command {
        Commands::Record(args) => run_record(args).await,
        Commands::Prepare(args) => run_prepare(args),
        Commands::Encode(args) => run_encode(args),
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %format!("{e:#}"), "Command failed");
    }

    result
}
