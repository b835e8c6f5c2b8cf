//! # Ingestion Pipeline
//!
//! Frame source registration and delivery.
//!
//! Responsibilities:
//! - Register frame sources (mock publishers or a real transport)
//! - Deliver arrivals directly or through one bounded, lossless queue
//! - Count received, forwarded and dropped frames
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionPipeline, MockFrameSource, MockSourceConfig};
//!
//! let mut pipeline = IngestionPipeline::new();
//! for source in &blueprint.sources {
//!     let config = MockSourceConfig::from_source(source, geometry)?;
//!     pipeline.register_source(Box::new(MockFrameSource::new(config, clock.clone())?))?;
//! }
//!
//! pipeline.start_all(Arc::new(move |packet| {
//!     let _ = synchronizer.on_packet_received(packet);
//! }));
//! ```

mod config;
mod error;
mod mock;
mod pipeline;

pub use config::{IngestionMetrics, MetricsSnapshot};
pub use contracts::FramePacket;
pub use error::{IngestionError, Result};
pub use mock::{MockFrameSource, MockSourceConfig};
pub use pipeline::IngestionPipeline;
