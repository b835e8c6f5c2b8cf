//! Recording statistics.

use std::time::Duration;

use ingestion::MetricsSnapshot;
use observability::RecordingSummary;
use sync_engine::SessionReport;

use super::StopReason;

/// Statistics from a recording run
#[derive(Debug, Clone)]
pub struct RecordStats {
    /// Why the recording ended
    pub reason: StopReason,

    /// Wall time from start to persisted ledger
    pub duration: Duration,

    /// Flushed session
    pub report: SessionReport,

    /// Emission intervals and rejections
    pub summary: RecordingSummary,

    /// Transport-side counters
    pub ingestion: MetricsSnapshot,

    /// Number of configured sources
    pub sources: usize,

    /// Number of configured sinks
    pub sinks: usize,
}

impl RecordStats {
    /// Merged frames per second of wall time
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.report.emitted as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Recording Statistics ===\n");

        println!("Overview");
        println!("   ├─ Stopped by: {}", self.reason);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Frames emitted: {}", self.report.emitted);
        println!("   ├─ Frames received: {}", self.ingestion.frames_received);
        println!("   ├─ Output FPS: {:.2}", self.fps());
        println!("   ├─ Sources: {}", self.sources);
        println!("   ├─ Sinks: {}", self.sinks);
        println!("   └─ Ledger: {}", self.report.ledger_path.display());

        let stats = &self.report.stats;
        println!("\nSynchronizer");
        println!("   ├─ Arrivals: {}", stats.arrivals);
        println!("   ├─ Incomplete evaluations: {}", stats.incomplete);
        println!("   ├─ Stale arrivals: {}", stats.stale);
        println!("   ├─ Rejected frames: {}", stats.rejected);
        println!("   ├─ Sink failures: {}", stats.sink_failures);
        println!("   └─ Failure timestamps: {}", self.report.failures);

        println!("\n{}", self.summary);
    }
}
