//! Materialize a resample plan as a renumbered frame directory

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::error::PlaybackError;
use crate::resampler::ResamplePlan;

/// Numbered frame file naming: zero-padded index plus extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameNaming {
    pub digits: usize,
    pub extension: String,
}

impl Default for FrameNaming {
    fn default() -> Self {
        Self {
            digits: 7,
            extension: "png".to_string(),
        }
    }
}

impl FrameNaming {
    pub fn file_name(&self, index: usize) -> String {
        format!("{:0width$}.{}", index, self.extension, width = self.digits)
    }

    /// `printf`-style pattern understood by ffmpeg's image demuxer
    pub fn printf_pattern(&self) -> String {
        format!("%0{}d.{}", self.digits, self.extension)
    }

    /// Whether `name` looks like a file this naming produces
    pub fn matches(&self, name: &str) -> bool {
        name.strip_suffix(&self.extension)
            .and_then(|stem| stem.strip_suffix('.'))
            .is_some_and(|stem| {
                stem.len() >= self.digits && stem.bytes().all(|b| b.is_ascii_digit())
            })
    }
}

fn clear_numbered_files(dir: &Path, naming: &FrameNaming) -> Result<usize, PlaybackError> {
    let mut removed = 0;
    let entries = fs::read_dir(dir).map_err(|e| PlaybackError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| PlaybackError::io(dir, e))?;
        let name = entry.file_name();
        let is_numbered = name.to_str().is_some_and(|n| naming.matches(n));
        if is_numbered && entry.path().is_file() {
            fs::remove_file(entry.path()).map_err(|e| PlaybackError::io(entry.path(), e))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Copy every planned frame from `source_dir` into `output_dir`
///
/// Output files are numbered by output position. Every source file is
/// checked before anything is touched, then stale numbered files in
/// `output_dir` are removed so an earlier, longer plan cannot leak frames
/// into the encode. Returns the number of files written.
#[instrument(
    name = "playback_materialize",
    skip(plan, naming),
    fields(frames = plan.len(), fps = plan.fps)
)]
pub fn materialize(
    plan: &ResamplePlan,
    source_dir: &Path,
    output_dir: &Path,
    naming: &FrameNaming,
) -> Result<usize, PlaybackError> {
    let copies: Vec<(PathBuf, PathBuf)> = plan
        .iter()
        .map(|frame| {
            (
                source_dir.join(naming.file_name(frame.source_index)),
                output_dir.join(naming.file_name(frame.output_index)),
            )
        })
        .collect();

    if let Some((missing, _)) = copies.iter().find(|(src, _)| !src.is_file()) {
        return Err(PlaybackError::MissingSourceFrame {
            path: missing.clone(),
        });
    }

    fs::create_dir_all(output_dir).map_err(|e| PlaybackError::io(output_dir, e))?;
    let removed = clear_numbered_files(output_dir, naming)?;
    if removed > 0 {
        debug!(removed, dir = %output_dir.display(), "cleared stale frames");
    }

    for (src, dst) in &copies {
        fs::copy(src, dst).map_err(|e| PlaybackError::io(dst, e))?;
    }

    info!(
        written = copies.len(),
        dir = %output_dir.display(),
        "renumbered frames written"
    );
    Ok(copies.len())
}
