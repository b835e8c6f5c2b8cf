//! Recording orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{Recorder, RecorderConfig, StopReason};
pub use stats::RecordStats;
