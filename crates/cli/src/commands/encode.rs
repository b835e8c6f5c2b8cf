//! `encode` command implementation.

use anyhow::{Context, Result};
use contracts::EncoderPreset;
use playback::{CommandEncoder, VideoEncoder};
use tracing::info;

use super::{load_settings, resolve_fps};
use crate::cli::EncodeArgs;

/// Execute the `encode` command
pub fn run_encode(args: &EncodeArgs) -> Result<()> {
    let (_, playback) = load_settings(args.config.as_deref())?;
    let fps = resolve_fps(args.fps, &playback)?;

    let preset: EncoderPreset = args.encoder.map_or(playback.encoder, Into::into);
    let movie_dir = args.movie_dir.clone().unwrap_or(playback.movie_dir);
    let output = args.output.clone().unwrap_or(playback.output);

    let encoder = CommandEncoder::new(preset);
    info!(
        encoder = encoder.name(),
        frames = %movie_dir.display(),
        output = %output.display(),
        fps,
        "Encoding video"
    );

    encoder
        .encode(&movie_dir, fps, &output)
        .with_context(|| format!("Failed to encode {}", output.display()))?;

    println!("Wrote {}", output.display());
    Ok(())
}
