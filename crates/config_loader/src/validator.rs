//! Configuration validation
//!
//! Rules:
//! - at least one source, ids unique and non-empty
//! - every source has a topic and a positive frequency
//! - frame dimensions are non-zero
//! - grid layouts have at least one column
//! - sink names non-empty; png sinks name an output `dir`
//! - playback default fps is positive

use std::collections::HashSet;

use contracts::{ContractError, MergeLayout, RecorderBlueprint, SinkType};

/// Validate a RecorderBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    validate_sources(blueprint)?;
    validate_geometry(blueprint)?;
    validate_layout(blueprint)?;
    validate_sinks(blueprint)?;
    validate_playback(blueprint)?;
    Ok(())
}

fn validate_sources(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    if blueprint.sources.is_empty() {
        return Err(ContractError::config_validation(
            "sources",
            "at least one source must be configured",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, source) in blueprint.sources.iter().enumerate() {
        if source.id.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("sources[{idx}].id"),
                "source id cannot be empty",
            ));
        }
        if !seen.insert(source.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("sources[id={}]", source.id),
                "duplicate source id",
            ));
        }
        if source.topic.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("sources[{}].topic", source.id),
                "topic cannot be empty",
            ));
        }
        if !source.frequency_hz.is_finite() || source.frequency_hz <= 0.0 {
            return Err(ContractError::config_validation(
                format!("sources[{}].frequency_hz", source.id),
                format!("frequency_hz must be > 0, got {}", source.frequency_hz),
            ));
        }
    }
    Ok(())
}

fn validate_geometry(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    let recorder = &blueprint.recorder;
    if recorder.frame_width == 0 || recorder.frame_height == 0 {
        return Err(ContractError::config_validation(
            "recorder.frame_width / recorder.frame_height",
            format!(
                "frame dimensions must be non-zero, got {}x{}",
                recorder.frame_width, recorder.frame_height
            ),
        ));
    }
    Ok(())
}

fn validate_layout(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    if let MergeLayout::Grid { columns: 0 } = blueprint.recorder.layout {
        return Err(ContractError::config_validation(
            "recorder.layout.columns",
            "grid layout needs at least one column",
        ));
    }
    Ok(())
}

fn validate_sinks(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
        if sink.sink_type == SinkType::Png && !sink.params.contains_key("dir") {
            return Err(ContractError::config_validation(
                format!("sinks[{}].params.dir", sink.name),
                "png sink requires an output dir",
            ));
        }
    }
    Ok(())
}

fn validate_playback(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    let fps = blueprint.playback.default_fps;
    if !fps.is_finite() || fps <= 0.0 {
        return Err(ContractError::config_validation(
            "playback.default_fps",
            format!("default_fps must be > 0, got {fps}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        ConfigVersion, PlaybackConfig, RecorderConfig, SinkConfig, SourceConfig,
    };
    use std::collections::HashMap;

    fn source(id: &str) -> SourceConfig {
        SourceConfig {
            id: id.to_string(),
            topic: format!("/{id}/image_raw"),
            frequency_hz: 30.0,
            attributes: HashMap::new(),
        }
    }

    fn valid_blueprint() -> RecorderBlueprint {
        RecorderBlueprint {
            version: ConfigVersion::V1,
            recorder: RecorderConfig::default(),
            sources: vec![source("rgb"), source("clf")],
            sinks: vec![SinkConfig {
                name: "frames".into(),
                sink_type: SinkType::Png,
                queue_capacity: 16,
                params: HashMap::from([("dir".to_string(), "/tmp/frames".to_string())]),
            }],
            playback: PlaybackConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate(&valid_blueprint()).is_ok());
    }

    #[test]
    fn empty_sources_rejected() {
        let mut bp = valid_blueprint();
        bp.sources.clear();
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("at least one source"));
    }

    #[test]
    fn duplicate_source_rejected() {
        let mut bp = valid_blueprint();
        bp.sources.push(source("rgb"));
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("duplicate source id"));
    }

    #[test]
    fn zero_frequency_rejected() {
        let mut bp = valid_blueprint();
        bp.sources[1].frequency_hz = 0.0;
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("frequency_hz"));
    }

    #[test]
    fn zero_dimension_rejected() {
        let mut bp = valid_blueprint();
        bp.recorder.frame_height = 0;
        assert!(validate(&bp).is_err());
    }

    #[test]
    fn grid_without_columns_rejected() {
        let mut bp = valid_blueprint();
        bp.recorder.layout = MergeLayout::Grid { columns: 0 };
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("column"));
    }

    #[test]
    fn png_sink_requires_dir() {
        let mut bp = valid_blueprint();
        bp.sinks[0].params.clear();
        let err = validate(&bp).unwrap_err();
        assert!(err.to_string().contains("dir"));
    }

    #[test]
    fn non_positive_fps_rejected() {
        let mut bp = valid_blueprint();
        bp.playback.default_fps = -1.0;
        assert!(validate(&bp).is_err());
    }
}
