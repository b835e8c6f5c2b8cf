//! Frame - decoded image buffer and its arrival envelope.
//!
//! The transport decodes wire images before they reach the recorder, so a
//! `Frame` is always raw interleaved pixels.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::SourceId;

/// Pixel layout of a decoded frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 8-bit blue/green/red, the layout camera drivers usually hand out
    #[default]
    Bgr8,
    Rgb8,
    Rgba8,
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Bgr8 | PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PixelFormat::Bgr8 => "bgr8",
            PixelFormat::Rgb8 => "rgb8",
            PixelFormat::Rgba8 => "rgba8",
            PixelFormat::Gray8 => "gray8",
        };
        f.write_str(name)
    }
}

/// Decoded image
///
/// Cloning only bumps the `Bytes` reference count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Pixel layout
    pub format: PixelFormat,

    /// Row-major interleaved pixel data
    pub data: Bytes,
}

impl Frame {
    /// Create a frame from raw pixels
    pub fn new(width: u32, height: u32, format: PixelFormat, data: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            format,
            data: data.into(),
        }
    }

    /// Create a frame where every byte has the same value
    pub fn filled(width: u32, height: u32, format: PixelFormat, value: u8) -> Self {
        let len = Self::expected_len(width, height, format);
        Self::new(width, height, format, vec![value; len])
    }

    /// Bytes per pixel
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels()
    }

    /// Payload length implied by the dimensions
    pub fn expected_len(width: u32, height: u32, format: PixelFormat) -> usize {
        width as usize * height as usize * format.channels()
    }

    /// One row of pixels, `None` past the last row
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let stride = self.stride();
        let start = y as usize * stride;
        self.data.get(start..start + stride)
    }
}

/// One arrival event delivered by the transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramePacket {
    /// Stream that produced the frame
    pub source_id: SourceId,

    /// Arrival time (seconds)
    pub timestamp: f64,

    /// Optional per-source sequence number (diagnostics only)
    pub sequence: Option<u64>,

    /// Decoded image
    pub frame: Frame,
}
