//! `prepare` command implementation.

use anyhow::{Context, Result};
use playback::FrameNaming;
use sync_engine::EmissionLedger;
use tracing::info;

use super::{load_settings, resolve_fps};
use crate::cli::PrepareArgs;
use crate::error::CliError;

/// Execute the `prepare` command
pub fn run_prepare(args: &PrepareArgs) -> Result<()> {
    let (recorder, playback) = load_settings(args.config.as_deref())?;
    let fps = resolve_fps(args.fps, &playback)?;

    let ledger_path = args.ledger.clone().unwrap_or(recorder.ledger_path);
    let frames_dir = args.frames_dir.clone().unwrap_or(playback.frames_dir);
    let movie_dir = args.movie_dir.clone().unwrap_or(playback.movie_dir);

    if !ledger_path.exists() {
        return Err(CliError::ledger_not_found(&ledger_path).into());
    }

    let ledger = EmissionLedger::load(&ledger_path)
        .with_context(|| format!("Failed to load ledger {}", ledger_path.display()))?;
    info!(
        ledger = %ledger_path.display(),
        entries = ledger.len(),
        fps,
        "Resampling emission ledger"
    );

    let plan = playback::resample(ledger.timestamps(), fps).context("Failed to resample ledger")?;
    let written = playback::materialize(&plan, &frames_dir, &movie_dir, &FrameNaming::default())
        .context("Failed to write renumbered frames")?;

    println!(
        "Prepared {} frames at {} fps ({:.2}s) in {}",
        written,
        playback::format_fps(fps),
        plan.duration(),
        movie_dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn prepares_renumbered_directory_from_ledger() {
        let dir = tempdir().unwrap();
        let frames = dir.path().join("frames");
        let movie = dir.path().join("movie");
        let ledger_path = dir.path().join("timelist.json");
        fs::create_dir_all(&frames).unwrap();

        let naming = FrameNaming::default();
        for i in 0..4 {
            fs::write(frames.join(naming.file_name(i)), [i as u8]).unwrap();
        }
        EmissionLedger::from_parts(vec![0.0, 1.0, 2.0, 3.0], Vec::new())
            .persist_to(&ledger_path, 4)
            .unwrap();

        let args = PrepareArgs {
            config: None,
            fps: Some(2.0),
            ledger: Some(ledger_path),
            frames_dir: Some(frames),
            movie_dir: Some(movie.clone()),
        };
        run_prepare(&args).unwrap();

        let bytes: Vec<u8> = (0..6)
            .map(|i| fs::read(movie.join(naming.file_name(i))).unwrap()[0])
            .collect();
        assert_eq!(bytes, vec![0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn missing_ledger_is_reported() {
        let dir = tempdir().unwrap();
        let args = PrepareArgs {
            config: None,
            fps: None,
            ledger: Some(dir.path().join("absent.bin")),
            frames_dir: None,
            movie_dir: None,
        };
        let err = run_prepare(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::LedgerNotFound { .. })
        ));
    }
}
