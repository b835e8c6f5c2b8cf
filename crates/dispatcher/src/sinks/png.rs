//! PngSequenceSink - zero-padded PNG sequence on disk

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use contracts::{ContractError, Frame, FrameSink, MergedFrame, PixelFormat};
use image::ColorType;
use tracing::{debug, error, instrument};

/// Sink that writes `<dir>/<index:07>.png` per merged frame
pub struct PngSequenceSink {
    name: String,
    dir: PathBuf,
    written: u64,
}

impl PngSequenceSink {
    /// Create a new PngSequenceSink, creating `dir` if needed
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            name: name.into(),
            dir,
            written: 0,
        })
    }

    /// Create from params map (for factory); `dir` is required
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let dir = params.get("dir").ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing 'dir' parameter")
        })?;
        Self::new(name, dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a given frame index is written to
    pub fn frame_path(&self, frame: &MergedFrame) -> PathBuf {
        self.dir.join(format!("{}.png", frame.file_stem()))
    }

    fn save_image(path: &Path, frame: &Frame) -> std::io::Result<()> {
        let expected = Frame::expected_len(frame.width, frame.height, frame.format);
        if frame.data.len() != expected {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "payload is {} bytes, {}x{} {} needs {}",
                    frame.data.len(),
                    frame.width,
                    frame.height,
                    frame.format,
                    expected
                ),
            ));
        }

        let saved = match frame.format {
            PixelFormat::Bgr8 => {
                // Convert BGR to RGB
                let mut rgb = frame.data.to_vec();
                for chunk in rgb.chunks_exact_mut(3) {
                    chunk.swap(0, 2);
                }
                image::save_buffer(path, &rgb, frame.width, frame.height, ColorType::Rgb8)
            }
            PixelFormat::Rgb8 => image::save_buffer(
                path,
                &frame.data,
                frame.width,
                frame.height,
                ColorType::Rgb8,
            ),
            PixelFormat::Rgba8 => image::save_buffer(
                path,
                &frame.data,
                frame.width,
                frame.height,
                ColorType::Rgba8,
            ),
            PixelFormat::Gray8 => {
                image::save_buffer(path, &frame.data, frame.width, frame.height, ColorType::L8)
            }
        };
        saved.map_err(std::io::Error::other)
    }
}

impl FrameSink for PngSequenceSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "png_sink_write",
        skip(self, frame),
        fields(sink = %self.name, frame_index = frame.frame_index)
    )]
    fn write(&mut self, frame: &MergedFrame) -> Result<(), ContractError> {
        let path = self.frame_path(frame);
        Self::save_image(&path, &frame.frame).map_err(|e| {
            error!(sink = %self.name, path = %path.display(), error = %e, "Write failed");
            ContractError::sink_write(&self.name, format!("{}: {e}", path.display()))
        })?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "png_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, written = self.written, "PngSequenceSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SourceId;
    use tempfile::tempdir;

    fn merged(index: u64, frame: Frame) -> MergedFrame {
        MergedFrame {
            frame_index: index,
            timestamp: index as f64,
            sources: vec![SourceId::from("rgb")],
            frame,
        }
    }

    #[test]
    fn writes_zero_padded_files_with_rgb_order() {
        let dir = tempdir().unwrap();
        let mut sink = PngSequenceSink::new("frames", dir.path()).unwrap();

        // one blue pixel in BGR order
        let frame = Frame::new(1, 1, PixelFormat::Bgr8, vec![255u8, 0, 0]);
        sink.write(&merged(12, frame)).unwrap();
        sink.close().unwrap();

        let path = dir.path().join("0000012.png");
        assert!(path.exists());
        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 255]);
    }

    #[test]
    fn gray_frames_round_trip() {
        let dir = tempdir().unwrap();
        let mut sink = PngSequenceSink::new("frames", dir.path()).unwrap();
        let frame = Frame::new(2, 1, PixelFormat::Gray8, vec![10u8, 200]);
        sink.write(&merged(0, frame)).unwrap();

        let decoded = image::open(dir.path().join("0000000.png")).unwrap().to_luma8();
        assert_eq!(decoded.into_raw(), vec![10, 200]);
    }

    #[test]
    fn short_payload_is_a_write_error() {
        let dir = tempdir().unwrap();
        let mut sink = PngSequenceSink::new("frames", dir.path()).unwrap();
        let frame = Frame::new(2, 2, PixelFormat::Rgb8, vec![0u8; 5]);
        let err = sink.write(&merged(0, frame)).unwrap_err();
        assert!(matches!(err, ContractError::SinkWrite { .. }));
        assert!(!dir.path().join("0000000.png").exists());
    }

    #[test]
    fn from_params_requires_dir() {
        assert!(PngSequenceSink::from_params("frames", &HashMap::new()).is_err());

        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let params = HashMap::from([("dir".to_string(), nested.display().to_string())]);
        let sink = PngSequenceSink::from_params("frames", &params).unwrap();
        assert!(sink.dir().is_dir());
    }
}
