//! QueuedSink - runs a sink on its own writer thread behind a bounded queue
//!
//! `write` only hands the frame over, so a slow sink does not hold the
//! synchronizer lock for the duration of the encode. The queue blocks when
//! full: frames are never dropped and are written in emission order.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use async_channel::{bounded, Receiver, Sender};
use tracing::{debug, error, instrument, warn};

use contracts::{ContractError, FrameSink, MergedFrame};

use crate::error::DispatcherError;
use crate::metrics::SinkMetrics;

enum Command {
    Write(Box<MergedFrame>),
    Flush,
}

/// Handle to a sink running on a writer thread
pub struct QueuedSink {
    /// Sink name
    name: String,
    /// Channel to the writer thread
    tx: Sender<Command>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Writer thread, `None` once closed
    worker: Option<JoinHandle<Result<(), ContractError>>>,
}

impl QueuedSink {
    /// Move `sink` onto a writer thread with a queue of `capacity` frames
    pub fn spawn<S: FrameSink + 'static>(sink: S, capacity: usize) -> Result<Self, DispatcherError> {
        let name = sink.name().to_string();
        if capacity == 0 {
            return Err(DispatcherError::sink_creation(
                &name,
                "queue_capacity must be > 0",
            ));
        }

        let (tx, rx) = bounded(capacity);
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();
        let worker = thread::Builder::new()
            .name(format!("sink-{name}"))
            .spawn(move || sink_worker(sink, rx, worker_metrics, worker_name))?;

        Ok(Self {
            name,
            tx,
            metrics,
            worker: Some(worker),
        })
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    fn send(&self, command: Command) -> Result<(), ContractError> {
        if self.worker.is_none() {
            return Err(ContractError::sink_closed(&self.name));
        }
        self.tx.send_blocking(command).map_err(|_| {
            error!(sink = %self.name, "Sink worker stopped unexpectedly");
            ContractError::sink_write(&self.name, "writer thread stopped")
        })?;
        self.metrics.set_queue_len(self.tx.len());
        observability::record_queue_depth(&self.name, self.tx.len());
        Ok(())
    }

    /// Drain the queue and join the writer thread
    #[instrument(name = "queued_sink_shutdown", skip(self), fields(sink = %self.name))]
    fn shutdown(&mut self) -> Result<(), ContractError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        self.tx.close();

        let result = match worker.join() {
            Ok(result) => result,
            Err(_) => {
                error!(sink = %self.name, "Writer thread panicked");
                Err(ContractError::sink_write(&self.name, "writer thread panicked"))
            }
        };

        let failures = self.metrics.failure_count();
        debug!(
            sink = %self.name,
            writes = self.metrics.write_count(),
            failures,
            "QueuedSink shutdown complete"
        );
        result?;
        if failures > 0 {
            return Err(ContractError::sink_write(
                &self.name,
                format!("{failures} queued writes failed"),
            ));
        }
        Ok(())
    }
}

impl FrameSink for QueuedSink {
    fn name(&self) -> &str {
        &self.name
    }

    /// Blocks while the queue is full
    fn write(&mut self, frame: &MergedFrame) -> Result<(), ContractError> {
        self.send(Command::Write(Box::new(frame.clone())))
    }

    /// Queue a flush behind the pending writes
    fn flush(&mut self) -> Result<(), ContractError> {
        self.send(Command::Flush)
    }

    /// Write everything still queued, then close the inner sink
    ///
    /// Reports the inner close error, or a write error if any queued write
    /// failed.
    fn close(&mut self) -> Result<(), ContractError> {
        self.shutdown()
    }
}

impl Drop for QueuedSink {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(sink = %self.name, error = %e, "QueuedSink dropped with errors");
        }
    }
}

/// Writer loop: consumes frames until the queue is closed and empty
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
fn sink_worker<S: FrameSink>(
    mut sink: S,
    rx: Receiver<Command>,
    metrics: Arc<SinkMetrics>,
    name: String,
) -> Result<(), ContractError> {
    debug!(sink = %name, "Sink worker started");

    while let Ok(command) = rx.recv_blocking() {
        metrics.set_queue_len(rx.len());

        match command {
            Command::Write(frame) => match sink.write(&frame) {
                Ok(()) => {
                    metrics.inc_write_count();
                    observability::record_frame_dispatched(&name, true);
                }
                Err(e) => {
                    metrics.inc_failure_count();
                    observability::record_frame_dispatched(&name, false);
                    error!(
                        sink = %name,
                        frame_index = frame.frame_index,
                        error = %e,
                        "Write failed"
                    );
                    // Keep draining; one bad frame must not stall the rest
                }
            },
            Command::Flush => {
                if let Err(e) = sink.flush() {
                    error!(sink = %name, error = %e, "Flush failed");
                }
            }
        }
    }

    // Cleanup
    if let Err(e) = sink.flush() {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    let closed = sink.close();
    if let Err(e) = &closed {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
    closed
}
