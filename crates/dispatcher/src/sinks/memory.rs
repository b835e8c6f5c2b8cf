//! MemorySink - keeps merged frames in a shared vector

use std::sync::{Arc, Mutex, PoisonError};

use contracts::{ContractError, FrameSink, MergedFrame};

/// Shared handle to the frames a `MemorySink` has accepted
pub type MemoryFrames = Arc<Mutex<Vec<MergedFrame>>>;

/// In-memory sink for tests and embedding
pub struct MemorySink {
    name: String,
    frames: MemoryFrames,
    closed: bool,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frames: Arc::new(Mutex::new(Vec::new())),
            closed: false,
        }
    }

    /// Handle that stays readable after the sink moves into a synchronizer
    pub fn frames(&self) -> MemoryFrames {
        Arc::clone(&self.frames)
    }
}

impl FrameSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, frame: &MergedFrame) -> Result<(), ContractError> {
        if self.closed {
            return Err(ContractError::sink_closed(&self.name));
        }
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(frame.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), ContractError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Frame, PixelFormat};

    #[test]
    fn frames_visible_through_handle_and_closed_rejects() {
        let mut sink = MemorySink::new("memory");
        let frames = sink.frames();
        let frame = MergedFrame {
            frame_index: 0,
            timestamp: 0.5,
            sources: Vec::new(),
            frame: Frame::filled(1, 1, PixelFormat::Gray8, 9),
        };

        sink.write(&frame).unwrap();
        assert_eq!(frames.lock().unwrap().len(), 1);

        sink.close().unwrap();
        assert!(matches!(
            sink.write(&frame),
            Err(ContractError::SinkClosed { .. })
        ));
        assert_eq!(frames.lock().unwrap().len(), 1);
    }
}
