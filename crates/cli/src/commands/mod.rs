//! Command implementations.

mod encode;
mod info;
mod prepare;
mod record;
mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::{PlaybackConfig, RecorderConfig};

use crate::error::CliError;

pub use encode::run_encode;
pub use info::run_info;
pub use prepare::run_prepare;
pub use record::run_record;
pub use validate::run_validate;

/// Recording and playback settings from an optional configuration file
///
/// Without a file, built-in defaults apply.
fn load_settings(config: Option<&Path>) -> Result<(RecorderConfig, PlaybackConfig)> {
    let Some(path) = config else {
        return Ok((RecorderConfig::default(), PlaybackConfig::default()));
    };
    if !path.exists() {
        return Err(CliError::config_not_found(path).into());
    }
    let blueprint = config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    Ok((blueprint.recorder, blueprint.playback))
}

/// Playback rate from the command line or configuration
fn resolve_fps(cli: Option<f64>, playback: &PlaybackConfig) -> Result<f64, CliError> {
    let fps = cli.unwrap_or(playback.default_fps);
    if fps.is_finite() && fps > 0.0 {
        Ok(fps)
    } else {
        Err(CliError::InvalidFps { fps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_falls_back_to_configuration() {
        let playback = PlaybackConfig::default();
        assert_eq!(resolve_fps(None, &playback).unwrap(), playback.default_fps);
        assert_eq!(resolve_fps(Some(24.0), &playback).unwrap(), 24.0);
        assert!(matches!(
            resolve_fps(Some(0.0), &playback),
            Err(CliError::InvalidFps { .. })
        ));
        assert!(resolve_fps(Some(f64::NAN), &playback).is_err());
    }

    #[test]
    fn missing_config_is_reported() {
        let err = load_settings(Some(Path::new("/nonexistent/recorder.toml"))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn no_config_uses_defaults() {
        let (recorder, playback) = load_settings(None).unwrap();
        assert_eq!(recorder.ledger_path, RecorderConfig::default().ledger_path);
        assert_eq!(playback.movie_dir, PlaybackConfig::default().movie_dir);
    }
}
