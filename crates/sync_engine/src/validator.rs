//! Frame validation against the configured geometry

use contracts::{Frame, FrameGeometry};

use crate::ValidationError;

/// Checks incoming frames before they are accepted into stream state
#[derive(Debug, Clone, Copy)]
pub struct FrameValidator {
    geometry: FrameGeometry,
}

impl FrameValidator {
    pub fn new(geometry: FrameGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Dimensions are checked first, then pixel format, then payload length.
    pub fn validate(&self, frame: &Frame) -> Result<(), ValidationError> {
        let expected = self.geometry;

        if frame.width != expected.width || frame.height != expected.height {
            return Err(ValidationError::DimensionMismatch {
                expected_w: expected.width,
                expected_h: expected.height,
                actual_w: frame.width,
                actual_h: frame.height,
            });
        }

        if frame.format != expected.format {
            return Err(ValidationError::FormatMismatch {
                expected: expected.format,
                actual: frame.format,
            });
        }

        let expected_len = Frame::expected_len(expected.width, expected.height, expected.format);
        if frame.data.len() != expected_len {
            return Err(ValidationError::BufferSize {
                expected: expected_len,
                actual: frame.data.len(),
            });
        }

        Ok(())
    }
}

impl Default for FrameValidator {
    fn default() -> Self {
        Self::new(FrameGeometry::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::PixelFormat;

    #[test]
    fn accepts_default_geometry() {
        let validator = FrameValidator::default();
        let frame = Frame::filled(320, 240, PixelFormat::Bgr8, 0);
        assert!(validator.validate(&frame).is_ok());
    }

    #[test]
    fn swapped_dimensions_are_a_mismatch() {
        let validator = FrameValidator::default();
        let frame = Frame::filled(240, 320, PixelFormat::Bgr8, 0);
        assert_eq!(
            validator.validate(&frame),
            Err(ValidationError::DimensionMismatch {
                expected_w: 320,
                expected_h: 240,
                actual_w: 240,
                actual_h: 320,
            })
        );
    }

    #[test]
    fn dimension_checked_before_format() {
        let validator = FrameValidator::default();
        let frame = Frame::filled(8, 8, PixelFormat::Gray8, 0);
        let err = validator.validate(&frame).unwrap_err();
        assert_eq!(err.reason(), "dimension_mismatch");
    }

    #[test]
    fn format_and_payload_checked() {
        let validator = FrameValidator::new(FrameGeometry {
            width: 2,
            height: 2,
            format: PixelFormat::Rgb8,
        });

        let gray = Frame::filled(2, 2, PixelFormat::Gray8, 0);
        assert!(matches!(
            validator.validate(&gray),
            Err(ValidationError::FormatMismatch { .. })
        ));

        let short = Frame::new(2, 2, PixelFormat::Rgb8, vec![0u8; 11]);
        assert_eq!(
            validator.validate(&short),
            Err(ValidationError::BufferSize {
                expected: 12,
                actual: 11
            })
        );
    }
}
