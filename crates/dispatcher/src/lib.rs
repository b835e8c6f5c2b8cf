//! # Dispatcher
//!
//! Output side of the recorder.
//!
//! Responsibilities:
//! - Write merged frames as a zero-padded PNG sequence
//! - Fan-out to several sinks, reporting failures to the synchronizer
//! - Isolate slow sinks behind a bounded, lossless writer queue

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{FrameSink, MergedFrame};
pub use dispatcher::{build_sink, create_dispatcher, Dispatcher};
pub use error::DispatcherError;
pub use handle::QueuedSink;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{LogSink, MemoryFrames, MemorySink, PngSequenceSink};
