//! Playback resampler
//!
//! Turns an irregular emission ledger into a fixed-rate output sequence by
//! picking, for every output tick, the most recent recorded frame at or
//! before that tick. Pure and allocation-only.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::ResampleInputError;

/// One output frame and the recorded frame it copies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannedFrame {
    /// Position in the output sequence
    pub output_index: usize,

    /// Index into the recorded sequence (and its ledger)
    pub source_index: usize,

    /// Output tick time this frame stands for
    pub target_time: f64,
}

/// Ordered output sequence at a fixed rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResamplePlan {
    pub frames: Vec<PlannedFrame>,
    pub fps: f64,
}

impl ResamplePlan {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlannedFrame> {
        self.frames.iter()
    }

    /// Selected recorded frames, in output order
    pub fn source_indices(&self) -> Vec<usize> {
        self.frames.iter().map(|f| f.source_index).collect()
    }

    /// Playing time of the output at `fps` (seconds)
    pub fn duration(&self) -> f64 {
        self.frames.len() as f64 / self.fps
    }
}

impl<'a> IntoIterator for &'a ResamplePlan {
    type Item = &'a PlannedFrame;
    type IntoIter = std::slice::Iter<'a, PlannedFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// Upper bound on the number of planned output frames
pub const MAX_PLAN_FRAMES: usize = 10_000_000;

fn check_input(timestamps: &[f64], fps: f64) -> Result<(), ResampleInputError> {
    if timestamps.is_empty() {
        return Err(ResampleInputError::Empty);
    }
    if !fps.is_finite() || fps <= 0.0 {
        return Err(ResampleInputError::InvalidRate(fps));
    }
    for (index, &t) in timestamps.iter().enumerate() {
        if !t.is_finite() {
            return Err(ResampleInputError::NonFinite { index });
        }
        if index > 0 && t < timestamps[index - 1] {
            return Err(ResampleInputError::NonMonotonic {
                index,
                previous: timestamps[index - 1],
                current: t,
            });
        }
    }

    let frames = (timestamps[timestamps.len() - 1] - timestamps[0]) * fps;
    if !frames.is_finite() || frames > MAX_PLAN_FRAMES as f64 {
        return Err(ResampleInputError::PlanTooLarge {
            frames,
            limit: MAX_PLAN_FRAMES,
        });
    }
    Ok(())
}

/// Resample `timestamps` to `fps`
///
/// Tick `k` falls at `t0 + k / fps`. The cursor moves forward while the
/// next recorded frame is at or before the tick, and the walk ends as soon
/// as the cursor lands on the last recorded frame, which is never emitted.
/// A one-element ledger therefore yields an empty plan.
///
/// # Errors
/// Empty input, a non-positive or non-finite rate, non-finite or
/// decreasing timestamps, and spans that would plan more than
/// [`MAX_PLAN_FRAMES`] frames are rejected before any work is done.
#[instrument(name = "playback_resample", skip(timestamps), fields(len = timestamps.len()))]
pub fn resample(timestamps: &[f64], fps: f64) -> Result<ResamplePlan, ResampleInputError> {
    check_input(timestamps, fps)?;

    let t0 = timestamps[0];
    let last = timestamps.len() - 1;
    let mut frames = Vec::new();
    let mut cursor = 0usize;

    loop {
        let output_index = frames.len();
        let target_time = t0 + output_index as f64 / fps;
        while cursor < last && timestamps[cursor + 1] <= target_time {
            cursor += 1;
        }
        if cursor >= last {
            break;
        }
        frames.push(PlannedFrame {
            output_index,
            source_index: cursor,
            target_time,
        });
    }

    debug!(planned = frames.len(), fps, "resample plan built");
    Ok(ResamplePlan { frames, fps })
}
