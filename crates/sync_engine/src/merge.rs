//! Merge strategies
//!
//! A strategy composes the latest frame of every source, in configured
//! source order, into one output frame. Implementations must be
//! deterministic: the same inputs always give the same bytes.

use contracts::{Frame, MergeLayout};

use crate::SyncError;

/// Composes per-source frames into one merged frame
pub trait MergeStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// `frames` is never empty and is in configured source order.
    fn merge(&self, frames: &[&Frame]) -> Result<Frame, SyncError>;
}

/// Tiles frames according to a `MergeLayout`
///
/// Horizontal is a single row, vertical a single column, grid fills rows
/// left to right. Tiles without a source stay black (zeroed).
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutMerger {
    layout: MergeLayout,
}

impl LayoutMerger {
    pub fn new(layout: MergeLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> MergeLayout {
        self.layout
    }

    /// (columns, rows) for `count` tiles
    fn grid_shape(&self, count: usize) -> (usize, usize) {
        let columns = match self.layout {
            MergeLayout::Horizontal => count,
            MergeLayout::Vertical => 1,
            MergeLayout::Grid { columns } => (columns as usize).clamp(1, count),
        };
        (columns, count.div_ceil(columns))
    }
}

impl MergeStrategy for LayoutMerger {
    fn name(&self) -> &'static str {
        match self.layout {
            MergeLayout::Horizontal => "horizontal",
            MergeLayout::Vertical => "vertical",
            MergeLayout::Grid { .. } => "grid",
        }
    }

    fn merge(&self, frames: &[&Frame]) -> Result<Frame, SyncError> {
        let first = frames
            .first()
            .ok_or_else(|| SyncError::Merge("no frames to merge".to_string()))?;

        for frame in frames {
            if frame.width != first.width
                || frame.height != first.height
                || frame.format != first.format
            {
                return Err(SyncError::Merge(format!(
                    "mixed geometry: {}x{} {} vs {}x{} {}",
                    first.width,
                    first.height,
                    first.format,
                    frame.width,
                    frame.height,
                    frame.format
                )));
            }
            let expected = Frame::expected_len(frame.width, frame.height, frame.format);
            if frame.data.len() != expected {
                return Err(SyncError::Merge(format!(
                    "payload is {} bytes, expected {expected}",
                    frame.data.len()
                )));
            }
        }

        if frames.len() == 1 {
            return Ok((*first).clone());
        }

        let (columns, rows) = self.grid_shape(frames.len());
        let tile_stride = first.stride();
        if tile_stride == 0 {
            return Err(SyncError::Merge("cannot tile zero-width frames".to_string()));
        }
        let tile_height = first.height as usize;
        let out_width = first.width as usize * columns;
        let out_height = tile_height * rows;
        let out_stride = tile_stride * columns;

        let mut data = vec![0u8; out_stride * out_height];
        for (tile, frame) in frames.iter().enumerate() {
            let x0 = (tile % columns) * tile_stride;
            let y0 = (tile / columns) * tile_height;
            for (y, row) in frame.data.chunks_exact(tile_stride).enumerate() {
                let start = (y0 + y) * out_stride + x0;
                data[start..start + tile_stride].copy_from_slice(row);
            }
        }

        let width = u32::try_from(out_width)
            .map_err(|_| SyncError::Merge(format!("merged width {out_width} overflows")))?;
        let height = u32::try_from(out_height)
            .map_err(|_| SyncError::Merge(format!("merged height {out_height} overflows")))?;

        Ok(Frame::new(width, height, first.format, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::PixelFormat;

    fn tile(value: u8) -> Frame {
        Frame::filled(2, 2, PixelFormat::Gray8, value)
    }

    fn merge(layout: MergeLayout, values: &[u8]) -> Frame {
        let frames: Vec<Frame> = values.iter().map(|v| tile(*v)).collect();
        let refs: Vec<&Frame> = frames.iter().collect();
        LayoutMerger::new(layout).merge(&refs).unwrap()
    }

    #[test]
    fn single_source_is_identity_for_every_layout() {
        for layout in [
            MergeLayout::Horizontal,
            MergeLayout::Vertical,
            MergeLayout::Grid { columns: 3 },
        ] {
            assert_eq!(merge(layout, &[9]), tile(9));
        }
    }

    #[test]
    fn horizontal_places_sources_side_by_side() {
        let out = merge(MergeLayout::Horizontal, &[1, 2]);
        assert_eq!((out.width, out.height), (4, 2));
        assert_eq!(&out.data[..], &[1, 1, 2, 2, 1, 1, 2, 2]);
    }

    #[test]
    fn vertical_stacks_sources() {
        let out = merge(MergeLayout::Vertical, &[1, 2]);
        assert_eq!((out.width, out.height), (2, 4));
        assert_eq!(&out.data[..], &[1, 1, 1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn grid_leaves_unused_tiles_black() {
        let out = merge(MergeLayout::Grid { columns: 2 }, &[1, 2, 3]);
        assert_eq!((out.width, out.height), (4, 4));
        assert_eq!(
            &out.data[..],
            &[1, 1, 2, 2, 1, 1, 2, 2, 3, 3, 0, 0, 3, 3, 0, 0]
        );
    }

    #[test]
    fn merge_is_deterministic_in_input_order() {
        let a = merge(MergeLayout::Horizontal, &[1, 2]);
        let b = merge(MergeLayout::Horizontal, &[2, 1]);
        assert_ne!(a, b);
        assert_eq!(a, merge(MergeLayout::Horizontal, &[1, 2]));
    }

    #[test]
    fn mixed_geometry_is_an_error() {
        let a = tile(1);
        let b = Frame::filled(3, 2, PixelFormat::Gray8, 1);
        let err = LayoutMerger::default().merge(&[&a, &b]).unwrap_err();
        assert!(matches!(err, SyncError::Merge(_)));
    }
}
