//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Stream Recorder - synchronized multi-camera recording and playback preparation
#[derive(Parser, Debug)]
#[command(
    name = "stream-recorder",
    author,
    version,
    about = "Synchronized multi-stream frame recorder",
    long_about = "Records merged frames from several independently clocked image streams.\n\n\
                  `record` captures until interrupted and persists the emission ledger; \n\
                  `prepare` resamples the ledger to a fixed rate and `encode` hands the \n\
                  renumbered frames to an external video encoder."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "STREAM_RECORDER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "STREAM_RECORDER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record merged frames until interrupted, then persist the ledger
    Record(RecordArgs),

    /// Resample the ledger and write the renumbered frame directory
    Prepare(PrepareArgs),

    /// Encode the renumbered frame directory into a video
    Encode(EncodeArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display emission ledger statistics
    Info(InfoArgs),
}

/// Arguments for the `record` command
#[derive(Parser, Debug, Clone)]
pub struct RecordArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "recorder.toml",
        env = "STREAM_RECORDER_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the ledger path from configuration
    #[arg(long, env = "STREAM_RECORDER_LEDGER")]
    pub ledger: Option<PathBuf>,

    /// Override the directory of every PNG sink
    #[arg(long, env = "STREAM_RECORDER_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Stop after this many merged frames (0 = unlimited)
    #[arg(long, default_value = "0", env = "STREAM_RECORDER_MAX_FRAMES")]
    pub max_frames: u64,

    /// Stop after this many seconds (0 = until interrupted)
    #[arg(long, default_value = "0", env = "STREAM_RECORDER_DURATION")]
    pub duration: f64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "STREAM_RECORDER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `prepare` command
#[derive(Parser, Debug, Clone)]
pub struct PrepareArgs {
    /// Configuration file supplying playback defaults
    #[arg(short, long, env = "STREAM_RECORDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output frame rate
    #[arg(long, env = "STREAM_RECORDER_FPS")]
    pub fps: Option<f64>,

    /// Emission ledger to resample
    #[arg(long, env = "STREAM_RECORDER_LEDGER")]
    pub ledger: Option<PathBuf>,

    /// Directory holding the recorded frames
    #[arg(long)]
    pub frames_dir: Option<PathBuf>,

    /// Directory receiving the renumbered frames
    #[arg(long)]
    pub movie_dir: Option<PathBuf>,
}

/// Arguments for the `encode` command
#[derive(Parser, Debug, Clone)]
pub struct EncodeArgs {
    /// Configuration file supplying playback defaults
    #[arg(short, long, env = "STREAM_RECORDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output frame rate
    #[arg(long, env = "STREAM_RECORDER_FPS")]
    pub fps: Option<f64>,

    /// Directory holding the renumbered frames
    #[arg(long)]
    pub movie_dir: Option<PathBuf>,

    /// Video file to produce
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// External encoder
    #[arg(long, value_enum)]
    pub encoder: Option<EncoderArg>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "recorder.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Emission ledger to inspect
    #[arg(long, default_value = "timelist.bin", env = "STREAM_RECORDER_LEDGER")]
    pub ledger: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

/// External encoder choice
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum EncoderArg {
    Mencoder,
    Ffmpeg,
}

impl From<EncoderArg> for contracts::EncoderPreset {
    fn from(encoder: EncoderArg) -> Self {
        match encoder {
            EncoderArg::Mencoder => contracts::EncoderPreset::Mencoder,
            EncoderArg::Ffmpeg => contracts::EncoderPreset::Ffmpeg,
        }
    }
}
