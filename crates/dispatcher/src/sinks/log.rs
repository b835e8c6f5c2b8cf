//! LogSink - logs merged frame summaries via tracing

use contracts::{ContractError, FrameSink, MergedFrame};
use tracing::{info, instrument};

/// Sink that logs frame summaries for debugging
pub struct LogSink {
    name: String,
    count: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
        }
    }

    fn log_frame_summary(&self, frame: &MergedFrame) {
        info!(
            sink = %self.name,
            frame_index = frame.frame_index,
            timestamp = frame.timestamp,
            sources = frame.sources.len(),
            width = frame.frame.width,
            height = frame.frame.height,
            "MergedFrame received"
        );
    }
}

impl FrameSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, frame: &MergedFrame) -> Result<(), ContractError> {
        self.log_frame_summary(frame);
        self.count += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, frames = self.count, "LogSink closed");
        Ok(())
    }
}
