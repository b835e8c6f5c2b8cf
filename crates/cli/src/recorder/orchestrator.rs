//! Recorder orchestrator - wires sources, synchronizer and sinks together.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{Clock, FrameCallback, FramePacket, RecorderBlueprint};
use ingestion::{IngestionPipeline, MockFrameSource, MockSourceConfig};
use observability::RecordingSummary;
use sync_engine::{
    ArrivalOutcome, LayoutMerger, LedgerFormat, RecordingSession, StreamSynchronizer, SyncError,
    SynchronizerConfig, SystemClock,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::RecordStats;

/// Recorder configuration
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Loaded blueprint, overrides already applied
    pub blueprint: RecorderBlueprint,

    /// Where the emission ledger is persisted
    pub ledger_path: PathBuf,

    /// Stop after this many merged frames (None = unlimited)
    pub max_frames: Option<u64>,

    /// Stop after this much wall time (None = until interrupted)
    pub duration: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Why a recording ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    Duration,
    MaxFrames,
    Aborted(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupted => write!(f, "interrupt"),
            Self::Duration => write!(f, "duration limit"),
            Self::MaxFrames => write!(f, "frame limit"),
            Self::Aborted(message) => write!(f, "abort ({message})"),
        }
    }
}

/// Main recording orchestrator
pub struct Recorder {
    config: RecorderConfig,
}

impl Recorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self { config }
    }

    /// Record until `shutdown` resolves or a configured limit is reached
    ///
    /// Sources are built before the recording session, so a setup error
    /// leaves an existing ledger untouched. Once the session exists the
    /// ledger is persisted on every exit path.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<RecordStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

        // Sinks
        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - merged frames will only be counted");
        }
        let dispatcher = dispatcher::create_dispatcher(&blueprint.sinks)
            .context("Failed to create dispatcher")?;
        info!(sinks = ?dispatcher.sink_names(), "Dispatcher ready");

        // Sources
        let geometry = blueprint.recorder.geometry();
        let mut ingestion = IngestionPipeline::new();
        for source in &blueprint.sources {
            let mock = MockSourceConfig::from_source(source, geometry)?;
            ingestion.register_source(Box::new(MockFrameSource::new(mock, clock.clone())?))?;
        }
        info!(active_sources = ingestion.source_count(), "Ingestion configured");

        // Synchronizer and session
        let format = LedgerFormat::from_path(&self.config.ledger_path)
            .context("Unsupported ledger path")?;
        let synchronizer = Arc::new(
            StreamSynchronizer::new(
                SynchronizerConfig::from_blueprint(blueprint),
                Box::new(LayoutMerger::new(blueprint.recorder.layout)),
                Box::new(dispatcher),
                clock.clone(),
            )
            .context("Failed to build synchronizer")?,
        );
        let session =
            RecordingSession::new(synchronizer.clone(), &self.config.ledger_path, format);

        info!(
            sources = ?blueprint.source_ids(),
            ledger = %self.config.ledger_path.display(),
            "Synchronizer configured"
        );

        let summary = Arc::new(Mutex::new(RecordingSummary::new()));
        let (stop_tx, mut stop_rx) = mpsc::unbounded_channel::<StopReason>();
        let callback = arrival_handler(
            synchronizer.clone(),
            summary.clone(),
            stop_tx,
            self.config.max_frames,
        );

        ingestion.start_all(callback);
        info!(
            max_frames = ?self.config.max_frames,
            duration = ?self.config.duration,
            "Recording"
        );

        let limit = self.config.duration;
        let deadline = async move {
            match limit {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::pin!(shutdown);
        let reason = tokio::select! {
            _ = &mut shutdown => StopReason::Interrupted,
            _ = deadline => StopReason::Duration,
            Some(reason) = stop_rx.recv() => reason,
        };
        info!(reason = %reason, "Stopping recording");

        // Stop the transport before draining so no callback races the close
        let (ingestion_snapshot, report) = tokio::task::spawn_blocking(move || {
            ingestion.stop_all();
            let snapshot = ingestion.metrics().snapshot();
            drop(ingestion);
            session.finish().map(|report| (snapshot, report))
        })
        .await
        .context("Shutdown task panicked")??;

        let mut summary = summary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for timestamp in synchronizer.ledger_snapshot().timestamps() {
            summary.on_emitted(*timestamp);
        }

        let stats = RecordStats {
            reason,
            duration: start_time.elapsed(),
            report,
            summary,
            ingestion: ingestion_snapshot,
            sources: blueprint.sources.len(),
            sinks: blueprint.sinks.len(),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            fps = format!("{:.2}", stats.fps()),
            "Recording shutdown complete"
        );

        Ok(stats)
    }
}

/// Consumer run on every source thread
fn arrival_handler(
    synchronizer: Arc<StreamSynchronizer>,
    summary: Arc<Mutex<RecordingSummary>>,
    stop_tx: mpsc::UnboundedSender<StopReason>,
    max_frames: Option<u64>,
) -> FrameCallback {
    Arc::new(move |packet: FramePacket| {
        let source_id = packet.source_id.clone();
        match synchronizer.on_packet_received(packet) {
            Ok(ArrivalOutcome::Emitted {
                frame_index,
                timestamp,
            }) => {
                debug!(frame_index, timestamp, "Merged frame emitted");
                if max_frames.is_some_and(|max| frame_index + 1 >= max) {
                    let _ = stop_tx.send(StopReason::MaxFrames);
                }
            }
            Ok(ArrivalOutcome::Rejected(reason)) => {
                summary
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .on_rejected(&source_id, reason.reason());
            }
            Ok(ArrivalOutcome::Incomplete { .. }) => {
                summary
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .on_incomplete();
            }
            Ok(ArrivalOutcome::Stale) => {
                summary
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .on_stale();
            }
            Ok(ArrivalOutcome::Closed) => {}
            Err(SyncError::Validation { source_id, error }) => {
                summary
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .on_rejected(&source_id, error.reason());
                error!(source = %source_id, error = %error, "Frame mismatch, aborting");
                let _ = stop_tx.send(StopReason::Aborted(format!("{source_id}: {error}")));
            }
            Err(e) => warn!(source = %source_id, error = %e, "Arrival failed"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{MismatchPolicy, SinkConfig, SinkType, SourceConfig};
    use sync_engine::EmissionLedger;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn blueprint(frames_dir: &std::path::Path) -> RecorderBlueprint {
        let sources = ["left", "right"]
            .iter()
            .map(|id| SourceConfig {
                id: id.to_string(),
                topic: format!("/{id}/image_raw"),
                frequency_hz: 50.0,
                attributes: HashMap::new(),
            })
            .collect();
        let sinks = vec![SinkConfig {
            name: "frames".to_string(),
            sink_type: SinkType::Png,
            queue_capacity: 8,
            params: HashMap::from([("dir".to_string(), frames_dir.display().to_string())]),
        }];
        RecorderBlueprint {
            version: Default::default(),
            recorder: contracts::RecorderConfig {
                frame_width: 8,
                frame_height: 4,
                ..Default::default()
            },
            sources,
            sinks,
            playback: Default::default(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn frame_limit_stops_and_persists_ledger() {
        let dir = tempdir().unwrap();
        let frames = dir.path().join("frames");
        let ledger = dir.path().join("timelist.json");

        let recorder = Recorder::new(RecorderConfig {
            blueprint: blueprint(&frames),
            ledger_path: ledger.clone(),
            max_frames: Some(5),
            duration: Some(Duration::from_secs(10)),
            metrics_port: None,
        });
        let stats = recorder.run(std::future::pending()).await.unwrap();

        assert_eq!(stats.reason, StopReason::MaxFrames);
        assert!(stats.report.emitted >= 5);
        assert_eq!(stats.summary.emitted, stats.report.emitted);
        assert!(ledger.exists());
        assert!(frames.join("0000000.png").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_signal_ends_recording() {
        let dir = tempdir().unwrap();
        let ledger = dir.path().join("timelist.bin");

        let recorder = Recorder::new(RecorderConfig {
            blueprint: blueprint(&dir.path().join("frames")),
            ledger_path: ledger.clone(),
            max_frames: None,
            duration: None,
            metrics_port: None,
        });
        let stats = recorder
            .run(tokio::time::sleep(Duration::from_millis(100)))
            .await
            .unwrap();

        assert_eq!(stats.reason, StopReason::Interrupted);
        assert_eq!(stats.sources, 2);
        assert!(ledger.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn mismatched_source_aborts_under_abort_policy() {
        let dir = tempdir().unwrap();
        let mut blueprint = blueprint(&dir.path().join("frames"));
        blueprint.recorder.mismatch_policy = MismatchPolicy::Abort;
        blueprint.sources[0]
            .attributes
            .insert("mismatch_every".to_string(), "1".to_string());

        let recorder = Recorder::new(RecorderConfig {
            blueprint,
            ledger_path: dir.path().join("timelist.bin"),
            max_frames: None,
            duration: Some(Duration::from_secs(10)),
            metrics_port: None,
        });
        let stats = recorder.run(std::future::pending()).await.unwrap();

        assert!(matches!(stats.reason, StopReason::Aborted(_)));
        assert!(stats.summary.total_rejected() >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failed_source_setup_keeps_previous_ledger() {
        let dir = tempdir().unwrap();
        let ledger = dir.path().join("timelist.bin");
        EmissionLedger::from_parts(vec![1.0, 2.0, 3.0], Vec::new())
            .persist_to(&ledger, 3)
            .unwrap();

        let mut blueprint = blueprint(&dir.path().join("frames"));
        blueprint.sources[1]
            .attributes
            .insert("jitter".to_string(), "abc".to_string());

        let recorder = Recorder::new(RecorderConfig {
            blueprint,
            ledger_path: ledger.clone(),
            max_frames: None,
            duration: Some(Duration::from_secs(1)),
            metrics_port: None,
        });
        assert!(recorder.run(std::future::pending()).await.is_err());

        let kept = EmissionLedger::load(&ledger).unwrap();
        assert_eq!(kept.timestamps(), &[1.0, 2.0, 3.0]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn summary_counts_match_synchronizer_stats() {
        let dir = tempdir().unwrap();
        let recorder = Recorder::new(RecorderConfig {
            blueprint: blueprint(&dir.path().join("frames")),
            ledger_path: dir.path().join("timelist.json"),
            max_frames: Some(10),
            duration: Some(Duration::from_secs(10)),
            metrics_port: None,
        });
        let stats = recorder.run(std::future::pending()).await.unwrap();

        assert_eq!(stats.summary.incomplete, stats.report.stats.incomplete);
        assert_eq!(stats.summary.stale, stats.report.stats.stale);
        assert!(stats.summary.incomplete >= 1);
    }
}
