//! Per-source stream state

use contracts::{Frame, SourceId};

/// Latest accepted frame of one configured source
///
/// Created for every source when the synchronizer is built and kept for its
/// whole lifetime. Only arrivals for `source_id` ever mutate it.
#[derive(Debug, Clone)]
pub struct StreamState {
    pub source_id: SourceId,
    pub topic: String,
    /// `None` until the first valid frame arrives
    pub last_frame: Option<Frame>,
    /// Arrival time of `last_frame`, or construction time before that
    pub last_timestamp: f64,
    /// Accepted frames so far
    pub frames_received: u64,
}

impl StreamState {
    pub fn new(source_id: SourceId, topic: impl Into<String>, created_at: f64) -> Self {
        Self {
            source_id,
            topic: topic.into(),
            last_frame: None,
            last_timestamp: created_at,
            frames_received: 0,
        }
    }

    #[inline]
    pub fn is_populated(&self) -> bool {
        self.last_frame.is_some()
    }

    pub fn update(&mut self, frame: Frame, arrival_time: f64) {
        self.last_frame = Some(frame);
        self.last_timestamp = arrival_time;
        self.frames_received += 1;
    }
}
