//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the recorder workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - All timestamps are seconds as `f64`
//! - Arrival and emission times are read from one shared `Clock`
//! - `sequence` on a packet is optional and only used for diagnostics

mod blueprint;
mod clock;
mod error;
mod frame;
mod frame_source;
mod merged;
mod sink;
mod source_id;

pub use blueprint::*;
pub use clock::Clock;
pub use error::*;
pub use frame::*;
pub use frame_source::{FrameCallback, FrameSource};
pub use merged::MergedFrame;
pub use sink::FrameSink;
pub use source_id::SourceId;
