//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use sync_engine::EmissionLedger;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Ledger statistics for JSON output
#[derive(Debug, Serialize, PartialEq)]
struct LedgerInfo {
    path: String,
    entries: usize,
    failures: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    first: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    span_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mean_rate_hz: Option<f64>,
}

impl LedgerInfo {
    fn from_ledger(path: String, ledger: &EmissionLedger) -> Self {
        let timestamps = ledger.timestamps();
        let span = ledger.span();
        Self {
            path,
            entries: ledger.len(),
            failures: ledger.failure_timestamps().len(),
            first: timestamps.first().copied(),
            last: timestamps.last().copied(),
            span_secs: span,
            mean_rate_hz: span
                .filter(|s| *s > 0.0)
                .map(|s| (ledger.len() - 1) as f64 / s),
        }
    }
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(ledger = %args.ledger.display(), "Loading emission ledger");

    if !args.ledger.exists() {
        return Err(CliError::ledger_not_found(&args.ledger).into());
    }

    let ledger = EmissionLedger::load(&args.ledger)
        .with_context(|| format!("Failed to load ledger {}", args.ledger.display()))?;
    let info = LedgerInfo::from_ledger(args.ledger.display().to_string(), &ledger);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize ledger info")?;
        println!("{}", json);
    } else {
        print_ledger_info(&info);
    }

    Ok(())
}

fn print_ledger_info(info: &LedgerInfo) {
    println!("\n=== Emission Ledger ===\n");
    println!("  Path: {}", info.path);
    println!("  Entries: {}", info.entries);
    println!("  Sink failures: {}", info.failures);

    if let (Some(first), Some(last)) = (info.first, info.last) {
        println!("  First emission: {:.6}", first);
        println!("  Last emission: {:.6}", last);
    }
    if let Some(span) = info.span_secs {
        println!("  Span: {:.3}s", span);
    }
    match info.mean_rate_hz {
        Some(rate) => println!("  Mean rate: {:.2} Hz", rate),
        None => println!("  Mean rate: N/A"),
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_from_ledger() {
        let ledger = EmissionLedger::from_parts(vec![10.0, 10.5, 11.0, 12.0], vec![10.75]);
        let info = LedgerInfo::from_ledger("timelist.bin".to_string(), &ledger);

        assert_eq!(info.entries, 4);
        assert_eq!(info.failures, 1);
        assert_eq!(info.first, Some(10.0));
        assert_eq!(info.last, Some(12.0));
        assert_eq!(info.span_secs, Some(2.0));
        assert_eq!(info.mean_rate_hz, Some(1.5));
    }

    #[test]
    fn empty_ledger_has_no_rate() {
        let info = LedgerInfo::from_ledger("timelist.bin".to_string(), &EmissionLedger::new());
        assert_eq!(info.entries, 0);
        assert!(info.mean_rate_hz.is_none());

        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("first").is_none());
    }
}
