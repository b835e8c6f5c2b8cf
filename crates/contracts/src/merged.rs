//! MergedFrame - synchronizer output
//!
//! One emission: the composite image plus the data needed to key it on disk.

use serde::{Deserialize, Serialize};

use crate::{Frame, SourceId};

/// One merged output frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedFrame {
    /// Zero-based emission index (equals the ledger position of `timestamp`)
    pub frame_index: u64,

    /// Emission time recorded in the ledger (seconds)
    pub timestamp: f64,

    /// Contributing sources, in composition order
    pub sources: Vec<SourceId>,

    /// Composite image
    pub frame: Frame,
}

impl MergedFrame {
    /// Zero-padded file stem used by sequence sinks and playback
    pub fn file_stem(&self) -> String {
        format!("{:07}", self.frame_index)
    }
}
