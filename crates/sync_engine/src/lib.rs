//! # Sync Engine
//!
//! Stream synchronizer and emission ledger.
//!
//! Responsibilities:
//! - Validate incoming frames against the configured geometry
//! - Keep the latest frame per source under one lock
//! - Emit one merged frame per watermark crossing
//! - Record emission times and persist them on shutdown
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sync_engine::{
//!     LayoutMerger, RecordingSession, StreamSynchronizer, SynchronizerConfig, SystemClock,
//! };
//!
//! let sync = Arc::new(StreamSynchronizer::new(
//!     SynchronizerConfig::from_blueprint(&blueprint),
//!     Box::new(LayoutMerger::new(blueprint.recorder.layout)),
//!     sink,
//!     Arc::new(SystemClock::new()),
//! )?);
//! let session = RecordingSession::with_detected_format(sync.clone(), "timelist.bin")?;
//!
//! // transport threads
//! sync.on_frame_arrived("rgb", frame, arrival_time)?;
//!
//! // shutdown: drain and persist once
//! session.finish()?;
//! ```

mod clock;
mod error;
mod ledger;
mod merge;
mod session;
mod state;
mod synchronizer;
mod validator;

pub use clock::{ManualClock, SystemClock};
pub use error::{LedgerError, SyncError, ValidationError};
pub use ledger::{EmissionLedger, LedgerFormat};
pub use merge::{LayoutMerger, MergeStrategy};
pub use session::{RecordingSession, SessionReport};
pub use state::StreamState;
pub use synchronizer::{ArrivalOutcome, StreamSynchronizer, SynchronizerConfig, SynchronizerStats};
pub use validator::FrameValidator;

pub use contracts::{Clock, FrameGeometry, MergeLayout, MergedFrame, MismatchPolicy};
