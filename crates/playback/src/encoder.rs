//! External video encoder adapter

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use contracts::EncoderPreset;
use tracing::{debug, info, instrument};

use crate::error::PlaybackError;
use crate::materialize::FrameNaming;

/// Turns a numbered frame directory into a video container
pub trait VideoEncoder {
    fn name(&self) -> &str;

    fn encode(&self, frames_dir: &Path, fps: f64, output: &Path) -> Result<(), PlaybackError>;
}

/// Whole rates print without a fraction, as encoders expect
pub fn format_fps(fps: f64) -> String {
    if fps.fract() == 0.0 && fps.abs() < 1e15 {
        format!("{}", fps as i64)
    } else {
        format!("{fps}")
    }
}

/// Command line for `preset`, excluding the program name
pub fn encoder_args(
    preset: EncoderPreset,
    frames_dir: &Path,
    fps: f64,
    output: &Path,
    naming: &FrameNaming,
) -> Vec<OsString> {
    let fps = format_fps(fps);
    match preset {
        EncoderPreset::Mencoder => {
            let mut input = OsString::from("mf://");
            input.push(frames_dir.join(format!("*.{}", naming.extension)));
            vec![
                input,
                "-mf".into(),
                format!("fps={fps}:type={}", naming.extension).into(),
                "-ovc".into(),
                "x264".into(),
                "-x264encopts".into(),
                "bitrate=12000:threads=2".into(),
                "-o".into(),
                output.into(),
            ]
        }
        EncoderPreset::Ffmpeg => vec![
            "-y".into(),
            "-framerate".into(),
            fps.into(),
            "-i".into(),
            frames_dir.join(naming.printf_pattern()).into(),
            "-c:v".into(),
            "libx264".into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            output.into(),
        ],
    }
}

fn program_name(preset: EncoderPreset) -> &'static str {
    match preset {
        EncoderPreset::Mencoder => "mencoder",
        EncoderPreset::Ffmpeg => "ffmpeg",
    }
}

/// Encoder that runs an external program
#[derive(Debug, Clone)]
pub struct CommandEncoder {
    preset: EncoderPreset,
    program: PathBuf,
    naming: FrameNaming,
}

impl CommandEncoder {
    pub fn new(preset: EncoderPreset) -> Self {
        Self::with_program(preset, program_name(preset))
    }

    /// Use a specific executable (name looked up on `PATH`, or a path)
    pub fn with_program(preset: EncoderPreset, program: impl Into<PathBuf>) -> Self {
        Self {
            preset,
            program: program.into(),
            naming: FrameNaming::default(),
        }
    }

    pub fn preset(&self) -> EncoderPreset {
        self.preset
    }
}

impl VideoEncoder for CommandEncoder {
    fn name(&self) -> &str {
        program_name(self.preset)
    }

    #[instrument(
        name = "playback_encode",
        skip(self, frames_dir, output),
        fields(encoder = self.name(), frames_dir = %frames_dir.display(), output = %output.display())
    )]
    fn encode(&self, frames_dir: &Path, fps: f64, output: &Path) -> Result<(), PlaybackError> {
        if !frames_dir.is_dir() {
            return Err(PlaybackError::io(
                frames_dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "frame directory missing"),
            ));
        }

        let program_label = self.program.display().to_string();
        let program = which::which(&self.program).map_err(|source| {
            PlaybackError::EncoderNotFound {
                program: program_label.clone(),
                source,
            }
        })?;

        let args = encoder_args(self.preset, frames_dir, fps, output, &self.naming);
        debug!(program = %program.display(), ?args, "running encoder");

        let result = Command::new(&program)
            .args(&args)
            .output()
            .map_err(|e| PlaybackError::io(&program, e))?;

        if !result.status.success() {
            return Err(PlaybackError::EncoderFailed {
                program: program_label,
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        info!(output = %output.display(), "video encoded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn mencoder_invocation() {
        let args = encoder_args(
            EncoderPreset::Mencoder,
            Path::new("movie"),
            5.0,
            Path::new("outputfile.mkv"),
            &FrameNaming::default(),
        );
        assert_eq!(
            strings(args),
            vec![
                "mf://movie/*.png",
                "-mf",
                "fps=5:type=png",
                "-ovc",
                "x264",
                "-x264encopts",
                "bitrate=12000:threads=2",
                "-o",
                "outputfile.mkv",
            ]
        );
    }

    #[test]
    fn ffmpeg_invocation() {
        let args = encoder_args(
            EncoderPreset::Ffmpeg,
            Path::new("movie"),
            12.5,
            Path::new("out.mp4"),
            &FrameNaming::default(),
        );
        assert_eq!(
            strings(args),
            vec![
                "-y",
                "-framerate",
                "12.5",
                "-i",
                "movie/%07d.png",
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "out.mp4",
            ]
        );
    }

    #[test]
    fn fps_formatting() {
        assert_eq!(format_fps(5.0), "5");
        assert_eq!(format_fps(29.97), "29.97");
    }

    #[test]
    fn missing_program_reported() {
        let dir = tempdir().unwrap();
        let encoder =
            CommandEncoder::with_program(EncoderPreset::Ffmpeg, "no-such-encoder-binary-xyz");
        let err = encoder
            .encode(dir.path(), 5.0, &dir.path().join("out.mkv"))
            .unwrap_err();
        assert!(matches!(err, PlaybackError::EncoderNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_surfaces() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.mkv");

        let ok = CommandEncoder::with_program(EncoderPreset::Ffmpeg, "true");
        assert!(ok.encode(dir.path(), 5.0, &out).is_ok());

        let failing = CommandEncoder::with_program(EncoderPreset::Ffmpeg, "false");
        assert!(matches!(
            failing.encode(dir.path(), 5.0, &out),
            Err(PlaybackError::EncoderFailed { .. })
        ));
    }
}
