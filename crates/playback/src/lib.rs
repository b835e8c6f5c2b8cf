//! # Playback
//!
//! Offline half of the recorder: turns the emission ledger of an irregular
//! recording into a fixed-rate frame sequence and hands it to an external
//! video encoder.
//!
//! ```ignore
//! let ledger = EmissionLedger::load("timelist.bin")?;
//! let plan = playback::resample(ledger.timestamps(), 5.0)?;
//! playback::materialize(&plan, frames_dir, movie_dir, &FrameNaming::default())?;
//! CommandEncoder::new(EncoderPreset::Mencoder).encode(movie_dir, 5.0, output)?;
//! ```

mod encoder;
mod error;
mod materialize;
mod resampler;

pub use contracts::EncoderPreset;
pub use encoder::{encoder_args, format_fps, CommandEncoder, VideoEncoder};
pub use error::{PlaybackError, ResampleInputError};
pub use materialize::{materialize, FrameNaming};
pub use resampler::{resample, PlannedFrame, ResamplePlan, MAX_PLAN_FRAMES};
