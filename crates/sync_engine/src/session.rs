//! Scoped recording session
//!
//! Owns the shutdown path of a recording: stop accepting arrivals, let the
//! in-flight critical section finish, close the sink, then persist the
//! ledger exactly once. Dropping an unfinished session runs the same drain.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::{LedgerFormat, StreamSynchronizer, SyncError, SynchronizerStats};

/// What a finished session left behind
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub ledger_path: PathBuf,
    pub emitted: u64,
    pub failures: usize,
    pub stats: SynchronizerStats,
}

/// Guard that flushes the ledger when the recording ends
#[derive(Debug)]
pub struct RecordingSession {
    synchronizer: Arc<StreamSynchronizer>,
    ledger_path: PathBuf,
    format: LedgerFormat,
    finished: bool,
}

impl RecordingSession {
    pub fn new(
        synchronizer: Arc<StreamSynchronizer>,
        ledger_path: impl Into<PathBuf>,
        format: LedgerFormat,
    ) -> Self {
        Self {
            synchronizer,
            ledger_path: ledger_path.into(),
            format,
            finished: false,
        }
    }

    /// Session with the ledger format taken from the path's extension
    pub fn with_detected_format(
        synchronizer: Arc<StreamSynchronizer>,
        ledger_path: impl Into<PathBuf>,
    ) -> Result<Self, SyncError> {
        let ledger_path = ledger_path.into();
        let format = LedgerFormat::from_path(&ledger_path)?;
        Ok(Self::new(synchronizer, ledger_path, format))
    }

    pub fn synchronizer(&self) -> &Arc<StreamSynchronizer> {
        &self.synchronizer
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    /// Ordered drain
    ///
    /// The ledger is persisted even when closing the sink fails; the close
    /// error is reported afterwards.
    pub fn finish(mut self) -> Result<SessionReport, SyncError> {
        self.drain()
    }

    #[instrument(name = "recording_session_drain", skip(self), fields(path = %self.ledger_path.display()))]
    fn drain(&mut self) -> Result<SessionReport, SyncError> {
        self.finished = true;

        let closed = self.synchronizer.shutdown();
        self.synchronizer
            .persist_ledger(&self.ledger_path, self.format)?;
        closed?;

        let ledger = self.synchronizer.ledger_snapshot();
        let report = SessionReport {
            ledger_path: self.ledger_path.clone(),
            emitted: self.synchronizer.emitted_frame_count(),
            failures: ledger.failure_timestamps().len(),
            stats: self.synchronizer.stats(),
        };
        info!(emitted = report.emitted, failures = report.failures, "recording finished");
        Ok(report)
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.drain() {
            error!(error = %e, "failed to flush recording on drop");
        }
    }
}
