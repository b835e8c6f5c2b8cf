//! `record` command implementation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use contracts::SinkType;
use tracing::{error, info, warn};

use crate::cli::RecordArgs;
use crate::error::CliError;
use crate::recorder::{Recorder, RecorderConfig, StopReason};

/// Wall-time limit from `--duration`; 0 means until interrupted
fn duration_limit(seconds: f64) -> Result<Option<Duration>, CliError> {
    if seconds == 0.0 {
        return Ok(None);
    }
    Duration::try_from_secs_f64(seconds)
        .map(Some)
        .map_err(|_| CliError::InvalidDuration { seconds })
}

/// Execute the `record` command
pub async fn run_record(args: &RecordArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");
    let duration = duration_limit(args.duration)?;

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref dir) = args.output_dir {
        info!(dir = %dir.display(), "Overriding PNG sink directory from CLI");
        for sink in blueprint
            .sinks
            .iter_mut()
            .filter(|sink| sink.sink_type == SinkType::Png)
        {
            sink.params
                .insert("dir".to_string(), dir.display().to_string());
        }
    }
    let ledger_path: PathBuf = args
        .ledger
        .clone()
        .unwrap_or_else(|| blueprint.recorder.ledger_path.clone());

    info!(
        sources = blueprint.sources.len(),
        sinks = blueprint.sinks.len(),
        width = blueprint.recorder.frame_width,
        height = blueprint.recorder.frame_height,
        format = %blueprint.recorder.pixel_format,
        "Configuration loaded"
    );

    let recorder = Recorder::new(RecorderConfig {
        blueprint,
        ledger_path,
        max_frames: (args.max_frames > 0).then_some(args.max_frames),
        duration,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    info!("Starting recorder, press Ctrl+C to stop");
    let stats = recorder
        .run(shutdown_signal())
        .await
        .context("Recording failed")?;

    stats.print_summary();

    if let StopReason::Aborted(message) = stats.reason {
        return Err(CliError::aborted(message).into());
    }

    info!("Stream recorder finished");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never fires; the other one still does.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping recorder...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duration_means_unlimited() {
        assert_eq!(duration_limit(0.0).unwrap(), None);
        assert_eq!(
            duration_limit(1.5).unwrap(),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn unrepresentable_duration_rejected() {
        for seconds in [1e30, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                duration_limit(seconds),
                Err(CliError::InvalidDuration { .. })
            ));
        }
    }
}
