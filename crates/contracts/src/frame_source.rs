//! FrameSource trait - transport-side stream abstraction
//!
//! The publish/subscribe transport is external; anything that can push
//! decoded frames for one source id implements this trait.

use std::sync::Arc;

use crate::FramePacket;

/// Frame arrival callback
///
/// Invoked on the source's own thread; several sources may call it
/// concurrently.
pub type FrameCallback = Arc<dyn Fn(FramePacket) + Send + Sync>;

/// One subscribed frame stream
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn FrameSource> = make_source();
/// source.listen(Arc::new(|packet| {
///     println!("frame from {}", packet.source_id);
/// }));
/// // ...
/// source.stop();
/// ```
pub trait FrameSource: Send + Sync {
    /// Source id this stream reports under
    fn source_id(&self) -> &str;

    /// Topic or address the stream is subscribed to
    fn topic(&self) -> &str;

    /// Register the arrival callback and start delivering frames
    ///
    /// Repeated calls while already listening are no-ops.
    fn listen(&self, callback: FrameCallback);

    /// Stop delivering frames
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
