//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `RecorderBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("recorder.toml")).unwrap();
//! println!("sources: {}", blueprint.sources.len());
//! ```

mod parser;
mod validator;

pub use contracts::RecorderBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<RecorderBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<RecorderBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Validate an already constructed blueprint
    pub fn validate(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    /// Serialize RecorderBlueprint to TOML string
    pub fn to_toml(blueprint: &RecorderBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize RecorderBlueprint to JSON string
    pub fn to_json(blueprint: &RecorderBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{MergeLayout, SinkType};
    use std::io::Write;

    const RECORDER_TOML: &str = r#"
[recorder]
frame_width = 320
frame_height = 240
pixel_format = "bgr8"
ledger_path = "/ramfs/timelist.bin"
layout = { kind = "grid", columns = 2 }

[[sources]]
id = "rgb"
topic = "/camera/rgb/image_raw"

[[sources]]
id = "clf"
topic = "/classifier/image_raw"
frequency_hz = 10.0

[[sinks]]
name = "frames"
sink_type = "png"
params = { dir = "/ramfs" }

[playback]
default_fps = 5.0
encoder = "ffmpeg"
"#;

    #[test]
    fn load_from_str_toml() {
        let bp = ConfigLoader::load_from_str(RECORDER_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.sources.len(), 2);
        assert_eq!(bp.sources[1].frequency_hz, 10.0);
        assert_eq!(bp.recorder.layout, MergeLayout::Grid { columns: 2 });
        assert_eq!(bp.sinks[0].sink_type, SinkType::Png);
    }

    #[test]
    fn round_trip_toml() {
        let bp = ConfigLoader::load_from_str(RECORDER_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.source_ids(), bp2.source_ids());
        assert_eq!(bp.recorder.layout, bp2.recorder.layout);
        assert_eq!(bp.playback.encoder, bp2.playback.encoder);
    }

    #[test]
    fn round_trip_json() {
        let bp = ConfigLoader::load_from_str(RECORDER_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.recorder.ledger_path, bp2.recorder.ledger_path);
        assert_eq!(bp.frames_output_dir(), bp2.frames_output_dir());
    }

    #[test]
    fn validation_runs_after_parse() {
        let content = r#"
[[sources]]
id = "cam"
topic = "/a"

[[sources]]
id = "cam"
topic = "/b"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn load_from_path_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(RECORDER_TOML.as_bytes()).unwrap();

        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(bp.sources[0].id, "rgb");
    }

    #[test]
    fn unknown_extension_rejected() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
