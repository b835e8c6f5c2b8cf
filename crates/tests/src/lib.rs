//! # Integration Tests
//!
//! End-to-end checks across the workspace crates.
//!
//! Covers:
//! - the shipped sample configuration
//! - record path: sources -> synchronizer -> PNG sink -> ledger
//! - playback path: ledger -> resample -> renumbered frame directory

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{MergeLayout, SinkType};
    use sync_engine::SynchronizerConfig;

    const SAMPLE: &str = include_str!("../../../recorder.toml");

    #[test]
    fn sample_configuration_loads() {
        let blueprint = ConfigLoader::load_from_str(SAMPLE, ConfigFormat::Toml).unwrap();

        assert_eq!(blueprint.recorder.layout, MergeLayout::Horizontal);
        assert_eq!(blueprint.sinks[0].sink_type, SinkType::Png);
        assert_eq!(
            blueprint.frames_output_dir(),
            Some(blueprint.playback.frames_dir.clone())
        );

        let config = SynchronizerConfig::from_blueprint(&blueprint);
        let ids: Vec<&str> = config.sources.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["left", "right"]);
        assert_eq!(config.geometry.width, 320);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{
        Clock, Frame, FrameGeometry, MergeLayout, MismatchPolicy, PixelFormat, SinkConfig,
        SinkType, SourceConfig, SourceId,
    };
    use dispatcher::create_dispatcher;
    use ingestion::{IngestionPipeline, MockFrameSource, MockSourceConfig};
    use playback::{materialize, resample, FrameNaming};
    use sync_engine::{
        ArrivalOutcome, EmissionLedger, LayoutMerger, LedgerFormat, ManualClock,
        RecordingSession, StreamSynchronizer, SynchronizerConfig, SystemClock,
    };

    fn geometry() -> FrameGeometry {
        FrameGeometry {
            width: 4,
            height: 2,
            format: PixelFormat::Bgr8,
        }
    }

    fn png_sinks(dir: &Path) -> Vec<SinkConfig> {
        vec![SinkConfig {
            name: "frames".to_string(),
            sink_type: SinkType::Png,
            queue_capacity: 16,
            params: HashMap::from([("dir".to_string(), dir.display().to_string())]),
        }]
    }

    fn synchronizer(
        sources: &[&str],
        frames_dir: &Path,
        clock: Arc<dyn Clock>,
    ) -> Arc<StreamSynchronizer> {
        let config = SynchronizerConfig {
            sources: sources
                .iter()
                .map(|id| (SourceId::from(*id), format!("/{id}/image_raw")))
                .collect(),
            geometry: geometry(),
            mismatch_policy: MismatchPolicy::Skip,
        };
        let dispatcher = create_dispatcher(&png_sinks(frames_dir)).unwrap();
        Arc::new(
            StreamSynchronizer::new(
                config,
                Box::new(LayoutMerger::new(MergeLayout::Horizontal)),
                Box::new(dispatcher),
                clock,
            )
            .unwrap(),
        )
    }

    /// Deterministic record, then prepare
    ///
    /// Arrival script and expected outcomes:
    /// left@0.0 incomplete, right@0.0 emit, left@0.5 emit, right@1.0 emit,
    /// left@1.0 stale, left@2.0 emit, right@3.0 emit
    #[test]
    fn test_record_then_prepare() {
        let dir = tempfile::tempdir().unwrap();
        let frames_dir = dir.path().join("frames");
        let movie_dir = dir.path().join("movie");
        let ledger_path = dir.path().join("timelist.bin");

        let clock = Arc::new(ManualClock::new(0.0));
        let sync = synchronizer(&["left", "right"], &frames_dir, clock.clone());
        let session = RecordingSession::new(sync.clone(), &ledger_path, LedgerFormat::Bincode);

        let script = [
            ("left", 0.0, 10u8),
            ("right", 0.0, 20),
            ("left", 0.5, 30),
            ("right", 1.0, 40),
            ("left", 1.0, 50),
            ("left", 2.0, 60),
            ("right", 3.0, 70),
        ];
        let mut outcomes = Vec::new();
        for (source, t, value) in script {
            clock.set(t);
            let frame = Frame::filled(4, 2, PixelFormat::Bgr8, value);
            outcomes.push(sync.on_frame_arrived(source, frame, t).unwrap());
        }

        assert!(matches!(outcomes[0], ArrivalOutcome::Incomplete { .. }));
        assert_eq!(outcomes[4], ArrivalOutcome::Stale);
        let emitted: Vec<u64> = outcomes
            .iter()
            .filter_map(|o| match o {
                ArrivalOutcome::Emitted { frame_index, .. } => Some(*frame_index),
                _ => None,
            })
            .collect();
        assert_eq!(emitted, vec![0, 1, 2, 3, 4]);

        let report = session.finish().unwrap();
        assert_eq!(report.emitted, 5);
        assert_eq!(report.failures, 0);

        // every emission has an image and a ledger entry
        let naming = FrameNaming::default();
        for i in 0..5 {
            assert!(frames_dir.join(naming.file_name(i)).is_file());
        }
        let ledger = EmissionLedger::load(&ledger_path).unwrap();
        assert_eq!(ledger.timestamps(), &[0.0, 0.5, 1.0, 2.0, 3.0]);

        // playback
        let plan = resample(ledger.timestamps(), 2.0).unwrap();
        assert_eq!(plan.source_indices(), vec![0, 1, 2, 2, 3, 3]);

        let written = materialize(&plan, &frames_dir, &movie_dir, &naming).unwrap();
        assert_eq!(written, 6);
        for frame in &plan {
            let copied = fs::read(movie_dir.join(naming.file_name(frame.output_index))).unwrap();
            let original = fs::read(frames_dir.join(naming.file_name(frame.source_index))).unwrap();
            assert_eq!(copied, original);
        }
    }

    /// Threaded sources through the queued ingestion path
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_mock_sources_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let frames_dir = dir.path().join("frames");
        let ledger_path = dir.path().join("timelist.json");

        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        let sync = synchronizer(&["left", "right"], &frames_dir, clock.clone());
        let session = RecordingSession::with_detected_format(sync.clone(), &ledger_path).unwrap();

        let mut pipeline = IngestionPipeline::new();
        for (id, hz) in [("left", 100.0), ("right", 60.0)] {
            let source = SourceConfig {
                id: id.to_string(),
                topic: format!("/{id}/image_raw"),
                frequency_hz: hz,
                attributes: HashMap::from([("jitter".to_string(), "0.3".to_string())]),
            };
            let config = MockSourceConfig::from_source(&source, geometry()).unwrap();
            pipeline
                .register_source(Box::new(MockFrameSource::new(config, clock.clone()).unwrap()))
                .unwrap();
        }

        let rx = pipeline.start_all_queued(64).unwrap();
        let target = 10u64;
        let consumer_sync = sync.clone();
        let consumer = tokio::spawn(async move {
            while let Ok(packet) = rx.recv().await {
                consumer_sync.on_packet_received(packet).unwrap();
                if consumer_sync.emitted_frame_count() >= target {
                    break;
                }
            }
        });

        tokio::time::timeout(Duration::from_secs(10), consumer)
            .await
            .expect("pipeline stalled")
            .unwrap();
        pipeline.stop_all();
        let snapshot = pipeline.metrics().snapshot();
        assert!(snapshot.frames_received >= target);

        let report = session.finish().unwrap();
        assert!(report.emitted >= target);

        let ledger = EmissionLedger::load(&ledger_path).unwrap();
        assert_eq!(ledger.len() as u64, report.emitted);
        assert!(ledger.timestamps().windows(2).all(|w| w[0] <= w[1]));

        let pngs = fs::read_dir(&frames_dir)
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .map(|e| e.path().extension().is_some_and(|x| x == "png"))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(pngs as u64, report.emitted);
    }
}
