//! Ingestion pipeline
//!
//! Owns the registered frame sources and connects them to one consumer,
//! either directly on each source's thread or through a bounded queue.

use std::sync::Arc;

use async_channel::{bounded, Receiver};
use contracts::{FrameCallback, FramePacket, FrameSource};
use tracing::{debug, info, instrument, warn};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};

/// Registered sources plus shared metrics
pub struct IngestionPipeline {
    /// Sources in registration order
    sources: Vec<Box<dyn FrameSource>>,

    metrics: Arc<IngestionMetrics>,
}

impl Default for IngestionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestionPipeline {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    /// Register a frame source
    ///
    /// # Errors
    /// `AlreadyRegistered` if a source with the same id exists.
    #[instrument(
        name = "ingestion_register_source",
        skip(self, source),
        fields(source_id = %source.source_id(), topic = %source.topic())
    )]
    pub fn register_source(&mut self, source: Box<dyn FrameSource>) -> Result<()> {
        if self.sources.iter().any(|s| s.source_id() == source.source_id()) {
            return Err(IngestionError::AlreadyRegistered {
                source_id: source.source_id().to_string(),
            });
        }
        debug!("registered frame source");
        self.sources.push(source);
        Ok(())
    }

    /// Start every source, delivering straight to `consumer`
    ///
    /// The consumer runs on the sources' own threads, possibly concurrently.
    #[instrument(name = "ingestion_start_all", skip(self, consumer))]
    pub fn start_all(&self, consumer: FrameCallback) {
        info!(count = self.sources.len(), "starting frame sources");
        let metrics = Arc::clone(&self.metrics);
        let callback: FrameCallback = Arc::new(move |packet: FramePacket| {
            metrics.record_received(&packet.source_id);
            consumer(packet);
            metrics.record_forwarded();
        });
        self.listen_all(&callback);
    }

    /// Start every source, funnelling arrivals into one bounded queue
    ///
    /// Source threads block while the queue is full, so arrivals are never
    /// dropped and stay in per-source order. Frames are only lost once the
    /// receiver has been dropped.
    #[instrument(name = "ingestion_start_all_queued", skip(self))]
    pub fn start_all_queued(&self, capacity: usize) -> Result<Receiver<FramePacket>> {
        if capacity == 0 {
            return Err(IngestionError::ZeroCapacity);
        }
        info!(count = self.sources.len(), capacity, "starting frame sources (queued)");

        let (tx, rx) = bounded(capacity);
        let metrics = Arc::clone(&self.metrics);
        let callback: FrameCallback = Arc::new(move |packet: FramePacket| {
            metrics.record_received(&packet.source_id);
            let source_id = packet.source_id.clone();
            match tx.send_blocking(packet) {
                Ok(()) => {
                    metrics.record_forwarded();
                    metrics.update_queue_len(tx.len());
                }
                Err(_) => {
                    metrics.record_dropped(&source_id);
                    warn!(source_id = %source_id, "ingestion queue closed, frame dropped");
                }
            }
        });
        self.listen_all(&callback);
        Ok(rx)
    }

    fn listen_all(&self, callback: &FrameCallback) {
        for source in &self.sources {
            if !source.is_listening() {
                debug!(source_id = %source.source_id(), "starting source");
                source.listen(Arc::clone(callback));
            }
        }
    }

    /// Stop every source
    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.sources.len(), "stopping frame sources");
        for source in &self.sources {
            if source.is_listening() {
                debug!(source_id = %source.source_id(), "stopping source");
                source.stop();
            }
        }
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Registered source ids in registration order
    pub fn source_ids(&self) -> Vec<String> {
        self.sources
            .iter()
            .map(|s| s.source_id().to_string())
            .collect()
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}
