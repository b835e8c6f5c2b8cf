//! Stream synchronizer
//!
//! Every arrival runs one critical section: update the source's stream
//! state, evaluate readiness, and on readiness merge, write to the sink and
//! append to the ledger. A merge happens only when all sources are
//! populated and the newest stream time has moved past the watermark set by
//! the previous emission, so one watermark crossing gives exactly one
//! emission.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{
    Frame, FrameGeometry, FramePacket, FrameSink, MergedFrame, MismatchPolicy, RecorderBlueprint,
    SourceId,
};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::{
    Clock, EmissionLedger, FrameValidator, LedgerFormat, MergeStrategy, StreamState, SyncError,
    ValidationError,
};

/// Synchronizer construction parameters
#[derive(Debug, Clone)]
pub struct SynchronizerConfig {
    /// (source id, topic) in composition order
    pub sources: Vec<(SourceId, String)>,
    pub geometry: FrameGeometry,
    pub mismatch_policy: MismatchPolicy,
}

impl SynchronizerConfig {
    pub fn from_blueprint(blueprint: &RecorderBlueprint) -> Self {
        Self {
            sources: blueprint
                .sources
                .iter()
                .map(|source| (SourceId::from(source.id.as_str()), source.topic.clone()))
                .collect(),
            geometry: blueprint.recorder.geometry(),
            mismatch_policy: blueprint.recorder.mismatch_policy,
        }
    }
}

/// What one arrival led to
#[derive(Debug, Clone, PartialEq)]
pub enum ArrivalOutcome {
    /// A merged frame was written and recorded
    Emitted { frame_index: u64, timestamp: f64 },
    /// Some sources have not delivered a valid frame yet
    Incomplete { missing: Vec<SourceId> },
    /// Nothing newer than the last emission
    Stale,
    /// Frame failed validation and was dropped
    Rejected(ValidationError),
    /// The synchronizer has shut down
    Closed,
}

/// Running counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynchronizerStats {
    pub arrivals: u64,
    pub emitted: u64,
    pub incomplete: u64,
    pub stale: u64,
    pub rejected: u64,
    pub sink_failures: u64,
}

struct SynchronizerState {
    streams: Vec<StreamState>,
    /// `None` until the first emission (below every timestamp)
    watermark: Option<f64>,
    emitted: u64,
    ledger: EmissionLedger,
    sink: Box<dyn FrameSink>,
    closed: bool,
    stats: SynchronizerStats,
}

impl SynchronizerState {
    fn newest_stream_time(&self) -> f64 {
        self.streams
            .iter()
            .filter(|s| s.is_populated())
            .map(|s| s.last_timestamp)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    fn oldest_stream_time(&self) -> Option<f64> {
        let mut oldest = f64::INFINITY;
        for stream in &self.streams {
            if !stream.is_populated() {
                return None;
            }
            oldest = oldest.min(stream.last_timestamp);
        }
        Some(oldest)
    }

    fn missing_sources(&self) -> Vec<SourceId> {
        self.streams
            .iter()
            .filter(|s| !s.is_populated())
            .map(|s| s.source_id.clone())
            .collect()
    }
}

/// Merges the latest frame of every configured source
///
/// Safe to share between transport threads (`Arc<StreamSynchronizer>`).
pub struct StreamSynchronizer {
    state: Mutex<SynchronizerState>,
    /// Source id -> slot in `streams`; fixed after construction
    slots: HashMap<SourceId, usize>,
    validator: FrameValidator,
    mismatch_policy: MismatchPolicy,
    merger: Box<dyn MergeStrategy>,
    clock: Arc<dyn Clock>,
    sink_name: String,
}

impl fmt::Debug for StreamSynchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSynchronizer")
            .field("sources", &self.slots.len())
            .field("geometry", &self.validator.geometry())
            .field("mismatch_policy", &self.mismatch_policy)
            .field("merger", &self.merger.name())
            .field("sink", &self.sink_name)
            .finish()
    }
}

impl StreamSynchronizer {
    /// Create a synchronizer
    ///
    /// # Errors
    /// `SyncError::Config` when no sources are configured or an id repeats.
    pub fn new(
        config: SynchronizerConfig,
        merger: Box<dyn MergeStrategy>,
        sink: Box<dyn FrameSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SyncError> {
        if config.sources.is_empty() {
            return Err(SyncError::Config("at least one source is required".into()));
        }

        let created_at = clock.now();
        let mut slots = HashMap::with_capacity(config.sources.len());
        let mut streams = Vec::with_capacity(config.sources.len());
        for (slot, (source_id, topic)) in config.sources.into_iter().enumerate() {
            if slots.insert(source_id.clone(), slot).is_some() {
                return Err(SyncError::Config(format!("duplicate source id '{source_id}'")));
            }
            streams.push(StreamState::new(source_id, topic, created_at));
        }

        let sink_name = sink.name().to_string();
        info!(
            sources = streams.len(),
            merger = merger.name(),
            sink = %sink_name,
            "stream synchronizer created"
        );

        Ok(Self {
            state: Mutex::new(SynchronizerState {
                streams,
                watermark: None,
                emitted: 0,
                ledger: EmissionLedger::new(),
                sink,
                closed: false,
                stats: SynchronizerStats::default(),
            }),
            slots,
            validator: FrameValidator::new(config.geometry),
            mismatch_policy: config.mismatch_policy,
            merger,
            clock,
            sink_name,
        })
    }

    /// The state is consistent at every unlock, so a poisoned lock is
    /// still usable.
    fn lock(&self) -> MutexGuard<'_, SynchronizerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle one arrival stamped by the caller
    ///
    /// A caller-side stamp taken before the lock can fall behind an emission
    /// made by a concurrent arrival; such a frame reports `Stale`. Live
    /// transports should use [`Self::on_frame_received`].
    ///
    /// # Errors
    /// - `UnknownSource` for ids that were not configured
    /// - `Validation` for invalid frames under the abort policy
    /// - `Sink` / `Merge` when the merged frame could not be written;
    ///   only a failure timestamp is recorded in that case
    #[instrument(
        name = "synchronizer_on_frame_arrived",
        level = "trace",
        skip(self, frame),
        fields(source_id = %source_id)
    )]
    pub fn on_frame_arrived(
        &self,
        source_id: &str,
        frame: Frame,
        arrival_time: f64,
    ) -> Result<ArrivalOutcome, SyncError> {
        self.arrive(source_id, frame, Some(arrival_time))
    }

    /// Handle one arrival, stamped with the synchronizer clock while the
    /// lock is held
    ///
    /// Stamps are then ordered with emissions, so a newer frame always
    /// moves past the watermark. Errors as for [`Self::on_frame_arrived`].
    #[instrument(
        name = "synchronizer_on_frame_received",
        level = "trace",
        skip(self, frame),
        fields(source_id = %source_id)
    )]
    pub fn on_frame_received(
        &self,
        source_id: &str,
        frame: Frame,
    ) -> Result<ArrivalOutcome, SyncError> {
        self.arrive(source_id, frame, None)
    }

    /// Convenience for transport callbacks, keeps the packet timestamp
    pub fn on_packet(&self, packet: FramePacket) -> Result<ArrivalOutcome, SyncError> {
        self.on_frame_arrived(&packet.source_id, packet.frame, packet.timestamp)
    }

    /// Convenience for transport callbacks, stamps in the critical section
    pub fn on_packet_received(&self, packet: FramePacket) -> Result<ArrivalOutcome, SyncError> {
        self.on_frame_received(&packet.source_id, packet.frame)
    }

    fn arrive(
        &self,
        source_id: &str,
        frame: Frame,
        arrival_time: Option<f64>,
    ) -> Result<ArrivalOutcome, SyncError> {
        let slot = *self
            .slots
            .get(source_id)
            .ok_or_else(|| SyncError::UnknownSource(SourceId::from(source_id)))?;

        let validation = self.validator.validate(&frame);

        let mut guard = self.lock();
        let state = &mut *guard;
        if state.closed {
            trace!("arrival after shutdown ignored");
            return Ok(ArrivalOutcome::Closed);
        }

        state.stats.arrivals += 1;
        observability::record_arrival(source_id);

        if let Err(error) = validation {
            return self.reject(state, source_id, error);
        }

        let arrival_time = arrival_time.unwrap_or_else(|| self.clock.now());
        state.streams[slot].update(frame, arrival_time);
        self.evaluate(state)
    }

    fn reject(
        &self,
        state: &mut SynchronizerState,
        source_id: &str,
        error: ValidationError,
    ) -> Result<ArrivalOutcome, SyncError> {
        state.stats.rejected += 1;
        state.ledger.append_failure(self.clock.now());
        observability::record_rejected(source_id, error.reason());
        warn!(source_id, error = %error, "frame rejected");

        match self.mismatch_policy {
            MismatchPolicy::Skip => Ok(ArrivalOutcome::Rejected(error)),
            MismatchPolicy::Abort => Err(SyncError::Validation {
                source_id: SourceId::from(source_id),
                error,
            }),
        }
    }

    /// Readiness check; runs with the lock held
    fn evaluate(&self, state: &mut SynchronizerState) -> Result<ArrivalOutcome, SyncError> {
        let missing = state.missing_sources();
        if !missing.is_empty() {
            state.stats.incomplete += 1;
            observability::record_incomplete(missing.len());
            debug!(missing = ?missing, "streams incomplete");
            return Ok(ArrivalOutcome::Incomplete { missing });
        }

        let newest = state.newest_stream_time();
        if let Some(watermark) = state.watermark {
            if newest <= watermark {
                state.stats.stale += 1;
                observability::record_stale();
                trace!(newest, watermark, "no new data since last emission");
                return Ok(ArrivalOutcome::Stale);
            }
        }

        let frame_index = state.emitted;
        let merged = {
            let frames: Vec<&Frame> = state
                .streams
                .iter()
                .filter_map(|s| s.last_frame.as_ref())
                .collect();
            self.merger.merge(&frames)
        };
        let merged = match merged {
            Ok(frame) => frame,
            Err(e) => {
                state.ledger.append_failure(self.clock.now());
                error!(frame_index, error = %e, "merge failed");
                return Err(e);
            }
        };

        let timestamp = self.clock.now();
        let output = MergedFrame {
            frame_index,
            timestamp,
            sources: state.streams.iter().map(|s| s.source_id.clone()).collect(),
            frame: merged,
        };

        if let Err(source) = state.sink.write(&output) {
            state.stats.sink_failures += 1;
            state.ledger.append_failure(timestamp);
            observability::record_sink_failure(&self.sink_name);
            error!(frame_index, sink = %self.sink_name, error = %source, "sink write failed");
            return Err(SyncError::Sink {
                frame_index,
                source,
            });
        }

        let interval = state.ledger.timestamps().last().map(|last| timestamp - last);
        state.ledger.append(timestamp);
        state.emitted += 1;
        state.stats.emitted += 1;
        state.watermark = Some(state.watermark.map_or(timestamp, |w| w.max(timestamp)));

        observability::record_emission(frame_index, interval);
        debug!(frame_index, timestamp, newest, "merged frame emitted");

        Ok(ArrivalOutcome::Emitted {
            frame_index,
            timestamp,
        })
    }

    /// Max arrival time over sources that have reported,
    /// `f64::NEG_INFINITY` if none have
    pub fn newest_stream_time(&self) -> f64 {
        self.lock().newest_stream_time()
    }

    /// Min arrival time over all sources, `None` while any is unpopulated
    pub fn oldest_stream_time(&self) -> Option<f64> {
        self.lock().oldest_stream_time()
    }

    pub fn all_streams_populated(&self) -> bool {
        self.lock().streams.iter().all(StreamState::is_populated)
    }

    pub fn emitted_frame_count(&self) -> u64 {
        self.lock().emitted
    }

    /// Time of the last emission, `None` before the first
    pub fn watermark(&self) -> Option<f64> {
        self.lock().watermark
    }

    pub fn stats(&self) -> SynchronizerStats {
        self.lock().stats
    }

    /// Copy of the ledger as it stands
    pub fn ledger_snapshot(&self) -> EmissionLedger {
        self.lock().ledger.clone()
    }

    /// Configured source ids, in composition order
    pub fn source_ids(&self) -> Vec<SourceId> {
        self.lock()
            .streams
            .iter()
            .map(|s| s.source_id.clone())
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Stop accepting arrivals and close the sink
    ///
    /// Taking the lock waits for any in-flight arrival. Closing the sink
    /// drains queued writes. Calling this again is a no-op.
    #[instrument(name = "synchronizer_shutdown", skip(self))]
    pub fn shutdown(&self) -> Result<(), SyncError> {
        let mut state = self.lock();
        if state.closed {
            return Ok(());
        }
        state.closed = true;

        let result = state.sink.close().map_err(SyncError::SinkClose);
        info!(
            emitted = state.emitted,
            failures = state.ledger.failure_timestamps().len(),
            "stream synchronizer shut down"
        );
        result
    }

    /// Check consistency and write the ledger
    #[instrument(name = "synchronizer_persist_ledger", skip(self, path), fields(path = %path.display()))]
    pub fn persist_ledger(&self, path: &Path, format: LedgerFormat) -> Result<(), SyncError> {
        let state = self.lock();
        state.ledger.persist(path, state.emitted, format)?;
        observability::record_ledger_persisted(
            state.ledger.len(),
            state.ledger.failure_timestamps().len(),
        );
        info!(entries = state.ledger.len(), "ledger persisted");
        Ok(())
    }
}
