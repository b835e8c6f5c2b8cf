//! Clock trait - shared time source
//!
//! Arrival stamps and emission stamps must come from the same time domain,
//! so transports and the synchronizer share one `Arc<dyn Clock>`.

/// Time source in seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}
