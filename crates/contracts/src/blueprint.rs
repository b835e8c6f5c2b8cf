//! RecorderBlueprint - Config Loader output
//!
//! Describes a complete recording setup: expected frame geometry, the
//! subscribed sources, merge layout, output sinks and playback defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::{PixelFormat, SourceId};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Recording settings
    #[serde(default)]
    pub recorder: RecorderConfig,

    /// Subscribed streams, in composition order
    pub sources: Vec<SourceConfig>,

    /// Merged frame outputs
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,

    /// Offline playback settings
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Recording settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Expected frame width in pixels
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,

    /// Expected frame height in pixels
    #[serde(default = "default_frame_height")]
    pub frame_height: u32,

    /// Expected pixel layout
    #[serde(default)]
    pub pixel_format: PixelFormat,

    /// What to do with frames that fail validation
    #[serde(default)]
    pub mismatch_policy: MismatchPolicy,

    /// Where the emission ledger is persisted on shutdown
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    /// How populated streams are composed into one frame
    #[serde(default)]
    pub layout: MergeLayout,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
            pixel_format: PixelFormat::default(),
            mismatch_policy: MismatchPolicy::default(),
            ledger_path: default_ledger_path(),
            layout: MergeLayout::default(),
        }
    }
}

impl RecorderConfig {
    /// Expected geometry of every incoming frame
    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry {
            width: self.frame_width,
            height: self.frame_height,
            format: self.pixel_format,
        }
    }
}

fn default_frame_width() -> u32 {
    320
}

fn default_frame_height() -> u32 {
    240
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("timelist.bin")
}

/// Fixed geometry every accepted frame must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self {
            width: default_frame_width(),
            height: default_frame_height(),
            format: PixelFormat::default(),
        }
    }
}

/// Handling of frames that fail validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Report, record a failure timestamp and drop the frame
    #[default]
    Skip,
    /// Report and return a fatal error to the caller
    Abort,
}

/// Composition layout for merged frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MergeLayout {
    /// Sources side by side, left to right
    #[default]
    Horizontal,
    /// Sources stacked, top to bottom
    Vertical,
    /// Row-major tiles with a fixed column count
    Grid { columns: u32 },
}

/// One subscribed stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique identifier
    pub id: String,

    /// Transport topic (configuration only)
    pub topic: String,

    /// Nominal publish rate (Hz), used by mock sources; must be > 0
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: f64,

    /// Source specific attributes
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

fn default_frequency_hz() -> f64 {
    30.0
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Handoff queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Zero-padded PNG sequence on disk
    Png,
    /// Tracing summary only
    Log,
}

/// Offline playback settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Directory holding the recorded frame sequence
    #[serde(default = "default_frames_dir")]
    pub frames_dir: PathBuf,

    /// Directory receiving the renumbered, resampled sequence
    #[serde(default = "default_movie_dir")]
    pub movie_dir: PathBuf,

    /// Encoded video file
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// External encoder
    #[serde(default)]
    pub encoder: EncoderPreset,

    /// Output rate used when none is given on the command line
    #[serde(default = "default_fps")]
    pub default_fps: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frames_dir: default_frames_dir(),
            movie_dir: default_movie_dir(),
            output: default_output(),
            encoder: EncoderPreset::default(),
            default_fps: default_fps(),
        }
    }
}

fn default_frames_dir() -> PathBuf {
    PathBuf::from("frames")
}

fn default_movie_dir() -> PathBuf {
    PathBuf::from("movie")
}

fn default_output() -> PathBuf {
    PathBuf::from("outputfile.mkv")
}

fn default_fps() -> f64 {
    5.0
}

/// External video encoder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderPreset {
    /// `mencoder` with x264
    #[default]
    Mencoder,
    /// `ffmpeg` with libx264
    Ffmpeg,
}

impl RecorderBlueprint {
    /// Configured source ids, in composition order
    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources
            .iter()
            .map(|source| SourceId::from(source.id.as_str()))
            .collect()
    }

    /// Directory of the first PNG sink, if any
    pub fn frames_output_dir(&self) -> Option<PathBuf> {
        self.sinks
            .iter()
            .find(|sink| sink.sink_type == SinkType::Png)
            .and_then(|sink| sink.params.get("dir"))
            .map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[[sources]]
id = "rgb"
topic = "/camera/rgb/image_raw"
"#;

    #[test]
    fn defaults_fill_missing_sections() {
        let blueprint: RecorderBlueprint = toml::from_str(MINIMAL).unwrap();
        assert_eq!(blueprint.recorder.frame_width, 320);
        assert_eq!(blueprint.recorder.frame_height, 240);
        assert_eq!(blueprint.recorder.pixel_format, PixelFormat::Bgr8);
        assert_eq!(blueprint.recorder.mismatch_policy, MismatchPolicy::Skip);
        assert_eq!(blueprint.recorder.layout, MergeLayout::Horizontal);
        assert_eq!(blueprint.sources[0].frequency_hz, 30.0);
        assert_eq!(blueprint.playback.default_fps, 5.0);
        assert_eq!(blueprint.playback.encoder, EncoderPreset::Mencoder);
        assert!(blueprint.sinks.is_empty());
    }

    #[test]
    fn grid_layout_is_tagged() {
        let content = r#"
[recorder]
layout = { kind = "grid", columns = 2 }

[[sources]]
id = "rgb"
topic = "/rgb"
"#;
        let blueprint: RecorderBlueprint = toml::from_str(content).unwrap();
        assert_eq!(blueprint.recorder.layout, MergeLayout::Grid { columns: 2 });
    }

    #[test]
    fn frames_output_dir_uses_first_png_sink() {
        let mut blueprint: RecorderBlueprint = toml::from_str(MINIMAL).unwrap();
        blueprint.sinks.push(SinkConfig {
            name: "log".into(),
            sink_type: SinkType::Log,
            queue_capacity: 10,
            params: HashMap::new(),
        });
        blueprint.sinks.push(SinkConfig {
            name: "frames".into(),
            sink_type: SinkType::Png,
            queue_capacity: 10,
            params: HashMap::from([("dir".to_string(), "/ramfs".to_string())]),
        });
        assert_eq!(blueprint.frames_output_dir(), Some(PathBuf::from("/ramfs")));
        assert_eq!(blueprint.source_ids(), vec![SourceId::from("rgb")]);
    }
}
