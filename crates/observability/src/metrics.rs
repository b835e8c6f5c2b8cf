//! Recorder metrics
//!
//! Thin helpers over the `metrics` facade plus an in-memory aggregator that
//! produces the end-of-run summary.

use std::collections::BTreeMap;

use metrics::{counter, gauge, histogram};

/// Record one frame arrival for a source
pub fn record_arrival(source_id: &str) {
    counter!(
        "recorder_arrivals_total",
        "source_id" => source_id.to_string()
    )
    .increment(1);
}

/// Record one merged emission
///
/// `interval_s` is the time since the previous emission, `None` for the
/// first one.
pub fn record_emission(frame_index: u64, interval_s: Option<f64>) {
    counter!("recorder_frames_emitted_total").increment(1);
    gauge!("recorder_last_frame_index").set(frame_index as f64);

    if let Some(interval) = interval_s {
        histogram!("recorder_emission_interval_s").record(interval);
    }
}

/// Record a frame dropped by validation
pub fn record_rejected(source_id: &str, reason: &'static str) {
    counter!(
        "recorder_frames_rejected_total",
        "source_id" => source_id.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// Record a readiness evaluation that found unpopulated sources
pub fn record_incomplete(missing: usize) {
    counter!("recorder_incomplete_total").increment(1);
    gauge!("recorder_sources_missing").set(missing as f64);
}

/// Record an arrival that carried no information newer than the watermark
pub fn record_stale() {
    counter!("recorder_stale_total").increment(1);
}

/// Record a merged frame the sink refused
pub fn record_sink_failure(sink_name: &str) {
    counter!(
        "recorder_sink_failures_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

/// Record the result of handing a frame to a sink
pub fn record_frame_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "recorder_frames_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record the depth of a sink handoff queue
pub fn record_queue_depth(sink_name: &str, depth: usize) {
    gauge!(
        "recorder_sink_queue_depth",
        "sink" => sink_name.to_string()
    )
    .set(depth as f64);
}

/// Record a successful ledger persist
pub fn record_ledger_persisted(entries: usize, failures: usize) {
    counter!("recorder_ledger_persisted_total").increment(1);
    gauge!("recorder_ledger_entries").set(entries as f64);
    gauge!("recorder_ledger_failures").set(failures as f64);
}

/// Recording run aggregator
///
/// Collects emission intervals and rejection counts in memory so the CLI
/// can print a summary when the run ends.
#[derive(Debug, Clone, Default)]
pub struct RecordingSummary {
    /// Emitted merged frames
    pub emitted: u64,

    /// Readiness evaluations with unpopulated sources
    pub incomplete: u64,

    /// Arrivals that did not move past the watermark
    pub stale: u64,

    /// Emission interval statistics (seconds)
    pub interval_stats: RunningStats,

    /// Rejections keyed by (source id, reason)
    pub rejections: BTreeMap<(String, String), u64>,

    last_emission: Option<f64>,
}

impl RecordingSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for an emission at `timestamp`
    pub fn on_emitted(&mut self, timestamp: f64) {
        self.emitted += 1;
        if let Some(last) = self.last_emission {
            self.interval_stats.push(timestamp - last);
        }
        self.last_emission = Some(timestamp);
    }

    pub fn on_incomplete(&mut self) {
        self.incomplete += 1;
    }

    pub fn on_stale(&mut self) {
        self.stale += 1;
    }

    pub fn on_rejected(&mut self, source_id: &str, reason: &str) {
        *self
            .rejections
            .entry((source_id.to_string(), reason.to_string()))
            .or_insert(0) += 1;
    }

    /// Total rejected frames across all sources
    pub fn total_rejected(&self) -> u64 {
        self.rejections.values().sum()
    }

    /// Mean emission rate in Hz, 0 when fewer than two emissions
    pub fn mean_rate_hz(&self) -> f64 {
        let mean = self.interval_stats.mean();
        if mean > 0.0 {
            1.0 / mean
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for RecordingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Recording Summary ===")?;
        writeln!(f, "Emitted frames: {}", self.emitted)?;
        writeln!(f, "Incomplete evaluations: {}", self.incomplete)?;
        writeln!(f, "Stale arrivals: {}", self.stale)?;
        writeln!(
            f,
            "Emission interval (s): {}",
            StatsSummary::from(&self.interval_stats)
        )?;
        writeln!(f, "Mean emission rate: {:.2} Hz", self.mean_rate_hz())?;

        if !self.rejections.is_empty() {
            writeln!(f, "Rejected frames: {}", self.total_rejected())?;
            for ((source, reason), count) in &self.rejections {
                writeln!(f, "  {source} ({reason}): {count}")?;
            }
        }

        Ok(())
    }
}

/// Snapshot of a `RunningStats`
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_stats_welford() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn summary_tracks_intervals_between_emissions() {
        let mut summary = RecordingSummary::new();
        summary.on_emitted(10.0);
        summary.on_emitted(10.5);
        summary.on_emitted(11.0);

        assert_eq!(summary.emitted, 3);
        assert_eq!(summary.interval_stats.count(), 2);
        assert!((summary.mean_rate_hz() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn summary_groups_rejections() {
        let mut summary = RecordingSummary::new();
        summary.on_rejected("rgb", "dimension_mismatch");
        summary.on_rejected("rgb", "dimension_mismatch");
        summary.on_rejected("clf", "format_mismatch");

        assert_eq!(summary.total_rejected(), 3);
        assert_eq!(
            summary
                .rejections
                .get(&("rgb".to_string(), "dimension_mismatch".to_string())),
            Some(&2)
        );

        let output = summary.to_string();
        assert!(output.contains("Rejected frames: 3"));
        assert!(output.contains("clf (format_mismatch): 1"));
    }

    #[test]
    fn empty_summary_reports_zero_rate() {
        let summary = RecordingSummary::new();
        assert_eq!(summary.mean_rate_hz(), 0.0);
        assert!(summary.to_string().contains("N/A"));
    }
}
