//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    sources: Vec<String>,
    sink_count: usize,
    layout: String,
    geometry: String,
    ledger_path: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let recorder = &blueprint.recorder;

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    sources: blueprint.sources.iter().map(|s| s.id.clone()).collect(),
                    sink_count: blueprint.sinks.len(),
                    layout: format!("{:?}", recorder.layout),
                    geometry: format!(
                        "{}x{} {}",
                        recorder.frame_width, recorder.frame_height, recorder.pixel_format
                    ),
                    ledger_path: recorder.ledger_path.display().to_string(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::RecorderBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - merged frames will only be counted".to_string());
    }

    match blueprint.frames_output_dir() {
        None => warnings.push(
            "No PNG sink configured - `prepare` will have no frames to renumber".to_string(),
        ),
        Some(dir) if dir != blueprint.playback.frames_dir => warnings.push(format!(
            "playback.frames_dir ({}) differs from the PNG sink directory ({})",
            blueprint.playback.frames_dir.display(),
            dir.display()
        )),
        Some(_) => {}
    }

    if blueprint.recorder.ledger_path.extension().is_none() {
        warnings.push(format!(
            "recorder.ledger_path ({}) has no extension - `record` needs .bin, .data or .json",
            blueprint.recorder.ledger_path.display()
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Sources: {}", summary.sources.join(", "));
            println!("  Sinks: {}", summary.sink_count);
            println!("  Layout: {}", summary.layout);
            println!("  Geometry: {}", summary.geometry);
            println!("  Ledger: {}", summary.ledger_path);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{RecorderBlueprint, SinkConfig, SinkType};
    use std::collections::HashMap;

    fn blueprint_with_sinks(sinks: Vec<SinkConfig>) -> RecorderBlueprint {
        RecorderBlueprint {
            version: Default::default(),
            recorder: Default::default(),
            sources: Vec::new(),
            sinks,
            playback: Default::default(),
        }
    }

    fn png_sink(dir: &str) -> SinkConfig {
        SinkConfig {
            name: "frames".to_string(),
            sink_type: SinkType::Png,
            queue_capacity: 10,
            params: HashMap::from([("dir".to_string(), dir.to_string())]),
        }
    }

    #[test]
    fn missing_sinks_warned() {
        let warnings = collect_warnings(&blueprint_with_sinks(Vec::new()));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn frames_dir_mismatch_warned() {
        let warnings = collect_warnings(&blueprint_with_sinks(vec![png_sink("elsewhere")]));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("elsewhere"));

        let warnings = collect_warnings(&blueprint_with_sinks(vec![png_sink("frames")]));
        assert!(warnings.is_empty());
    }
}
