//! Ingestion metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Ingestion counters, shared by all source callbacks
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Frames delivered by sources
    pub frames_received: AtomicU64,

    /// Frames handed to the consumer
    pub frames_forwarded: AtomicU64,

    /// Frames lost because the queue was closed
    pub frames_dropped: AtomicU64,

    /// Current queue length (queued mode)
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self, source_id: &str) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            "ingestion_frames_received_total",
            "source_id" => source_id.to_string()
        )
        .increment(1);
    }

    pub fn record_forwarded(&self) {
        self.frames_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, source_id: &str) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            "ingestion_frames_dropped_total",
            "source_id" => source_id.to_string()
        )
        .increment(1);
    }

    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
        metrics::gauge!("ingestion_queue_len").set(len as f64);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_forwarded: self.frames_forwarded.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `IngestionMetrics`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub frames_forwarded: u64,
    pub frames_dropped: u64,
    pub queue_len: usize,
}
