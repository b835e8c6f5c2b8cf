//! FrameSink trait - output side of the synchronizer
//!
//! Sinks are driven from inside the synchronizer's critical section, so the
//! interface is synchronous. Slow sinks should be wrapped in a queued sink
//! that hands frames to a writer thread.

use crate::{ContractError, MergedFrame};

/// Merged frame output
///
/// All sink implementations must implement this trait.
pub trait FrameSink: Send {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one merged frame
    ///
    /// # Errors
    /// Returns write error (should include context). A failed write means the
    /// frame was not accepted and must not be recorded in the ledger.
    fn write(&mut self, frame: &MergedFrame) -> Result<(), ContractError>;

    /// Flush buffered output (if any)
    fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink; pending writes are completed before returning
    fn close(&mut self) -> Result<(), ContractError>;
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write(&mut self, frame: &MergedFrame) -> Result<(), ContractError> {
        (**self).write(frame)
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<(), ContractError> {
        (**self).close()
    }
}
