//! Sink implementations
//!
//! Contains PngSequenceSink, LogSink, and MemorySink.

mod log;
mod memory;
mod png;

pub use self::log::LogSink;
pub use self::memory::{MemoryFrames, MemorySink};
pub use self::png::PngSequenceSink;
