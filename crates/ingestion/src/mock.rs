//! Mock frame source
//!
//! Stands in for the pub/sub transport: one thread per source publishing
//! synthetic frames at the configured rate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use contracts::{
    Clock, Frame, FrameCallback, FrameGeometry, FramePacket, FrameSource, SourceConfig, SourceId,
};
use rand::Rng;
use tracing::{debug, error, trace};

use crate::error::{IngestionError, Result};

/// Mock source settings
#[derive(Debug, Clone)]
pub struct MockSourceConfig {
    pub source_id: SourceId,

    pub topic: String,

    /// Publish rate (Hz)
    pub frequency_hz: f64,

    /// Geometry of generated frames
    pub geometry: FrameGeometry,

    /// Random period variation as a fraction of the period, in [0, 1)
    pub jitter: f64,

    /// Every n-th frame is published one pixel too wide
    pub mismatch_every: Option<u64>,
}

impl MockSourceConfig {
    /// Build from a configured source
    ///
    /// Reads the optional `jitter` and `mismatch_every` attributes.
    pub fn from_source(source: &SourceConfig, geometry: FrameGeometry) -> Result<Self> {
        let invalid = |message: String| IngestionError::InvalidSource {
            source_id: source.id.clone(),
            message,
        };

        let jitter = match source.attributes.get("jitter") {
            Some(raw) => raw
                .parse::<f64>()
                .map_err(|e| invalid(format!("jitter '{raw}': {e}")))?,
            None => 0.0,
        };
        let mismatch_every = match source.attributes.get("mismatch_every") {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|e| invalid(format!("mismatch_every '{raw}': {e}")))?,
            ),
            None => None,
        };

        Ok(Self {
            source_id: SourceId::from(source.id.as_str()),
            topic: source.topic.clone(),
            frequency_hz: source.frequency_hz,
            geometry,
            jitter,
            mismatch_every,
        })
    }

    fn frame(&self, sequence: u64) -> Frame {
        let FrameGeometry {
            width,
            height,
            format,
        } = self.geometry;
        let value = (sequence % 251) as u8;

        match self.mismatch_every {
            Some(n) if n > 0 && sequence % n == 0 => Frame::filled(width + 1, height, format, value),
            _ => Frame::filled(width, height, format, value),
        }
    }
}

/// Synthetic camera feed
pub struct MockFrameSource {
    config: MockSourceConfig,
    clock: Arc<dyn Clock>,
    listening: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MockFrameSource {
    /// Arrival stamps are read from `clock`
    pub fn new(config: MockSourceConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        if !config.frequency_hz.is_finite() || config.frequency_hz <= 0.0 {
            return Err(IngestionError::InvalidSource {
                source_id: config.source_id.to_string(),
                message: format!("frequency_hz must be > 0, got {}", config.frequency_hz),
            });
        }
        if !(0.0..1.0).contains(&config.jitter) {
            return Err(IngestionError::InvalidSource {
                source_id: config.source_id.to_string(),
                message: format!("jitter must be in [0, 1), got {}", config.jitter),
            });
        }

        Ok(Self {
            config,
            clock,
            listening: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &MockSourceConfig {
        &self.config
    }
}

fn publish_loop(
    config: MockSourceConfig,
    clock: Arc<dyn Clock>,
    listening: Arc<AtomicBool>,
    callback: FrameCallback,
) {
    let period = 1.0 / config.frequency_hz;
    let mut rng = rand::rng();
    let mut sequence = 0u64;

    debug!(
        source_id = %config.source_id,
        frequency_hz = config.frequency_hz,
        "mock frame source started"
    );

    while listening.load(Ordering::Acquire) {
        sequence += 1;
        let packet = FramePacket {
            source_id: config.source_id.clone(),
            timestamp: clock.now(),
            sequence: Some(sequence),
            frame: config.frame(sequence),
        };
        trace!(source_id = %config.source_id, sequence, "mock frame published");
        callback(packet);

        let factor = if config.jitter > 0.0 {
            1.0 + rng.random_range(-config.jitter..config.jitter)
        } else {
            1.0
        };
        thread::sleep(Duration::from_secs_f64(period * factor));
    }

    debug!(source_id = %config.source_id, published = sequence, "mock frame source stopped");
}

impl FrameSource for MockFrameSource {
    fn source_id(&self) -> &str {
        &self.config.source_id
    }

    fn topic(&self) -> &str {
        &self.config.topic
    }

    fn listen(&self, callback: FrameCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let config = self.config.clone();
        let clock = Arc::clone(&self.clock);
        let listening = Arc::clone(&self.listening);

        let spawned = thread::Builder::new()
            .name(format!("mock-{}", self.config.source_id))
            .spawn(move || publish_loop(config, clock, listening, callback));

        match spawned {
            Ok(handle) => {
                *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
            }
            Err(e) => {
                self.listening.store(false, Ordering::SeqCst);
                error!(source_id = %self.config.source_id, error = %e, "failed to spawn mock source");
            }
        }
    }

    /// Joins the publishing thread, so no callback runs after this returns
    fn stop(&self) {
        if !self.listening.swap(false, Ordering::SeqCst) {
            return;
        }
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                error!(source_id = %self.config.source_id, "mock source thread panicked");
            }
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Acquire)
    }
}

impl Drop for MockFrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}
