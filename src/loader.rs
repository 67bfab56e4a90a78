//! Raw plane loading

use crate::error::{PlaneError, Result};
use crate::format::RawPlaneSource;
use ndarray::{Array2, ArrayView2};
use std::path::Path;
use tracing::debug;

/// Immutable 2D grid of 8-bit samples, shape (height, width), row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleGrid {
    samples: Array2<u8>,
}

impl SampleGrid {
    /// Reshape the first `width * height` bytes of `bytes` into a grid.
    /// Trailing bytes are ignored.
    pub fn from_bytes(bytes: &[u8], width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PlaneError::InvalidDimensions { width, height });
        }
        let expected = width
            .checked_mul(height)
            .ok_or(PlaneError::InvalidDimensions { width, height })?;
        if bytes.len() < expected {
            return Err(PlaneError::Shape {
                expected,
                actual: bytes.len(),
            });
        }

        let samples = Array2::from_shape_vec((height, width), bytes[..expected].to_vec())
            .map_err(|_| PlaneError::InvalidDimensions { width, height })?;
        Ok(Self { samples })
    }

    pub fn width(&self) -> usize {
        self.samples.ncols()
    }

    pub fn height(&self) -> usize {
        self.samples.nrows()
    }

    /// Sample at row `r`, column `c`
    pub fn get(&self, r: usize, c: usize) -> Option<u8> {
        self.samples.get((r, c)).copied()
    }

    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.samples.view()
    }

    /// Samples in row-major order
    pub fn to_vec(&self) -> Vec<u8> {
        self.samples.iter().copied().collect()
    }
}

/// Read a whole file, reporting a missing file as [`PlaneError::NotFound`]
pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PlaneError::NotFound(path.to_path_buf()),
        _ => PlaneError::Io(e),
    })
}

/// Reads raw plane dumps from disk
///
/// Format agnostic: the caller decides the grid size, either directly or
/// through a [`RawPlaneSource`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaneLoader;

impl PlaneLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load `path` as a `width` x `height` grid
    pub fn load(&self, path: impl AsRef<Path>, width: usize, height: usize) -> Result<SampleGrid> {
        let path = path.as_ref();
        if width == 0 || height == 0 {
            return Err(PlaneError::InvalidDimensions { width, height });
        }

        let bytes = read_bytes(path)?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());

        let grid = SampleGrid::from_bytes(&bytes, width, height)?;
        if bytes.len() > width * height {
            debug!(
                "Ignoring {} trailing bytes in {}",
                bytes.len() - width * height,
                path.display()
            );
        }

        Ok(grid)
    }

    /// Load a plane dump using the geometry resolved from its format and plane
    pub fn load_source(&self, source: &RawPlaneSource) -> Result<SampleGrid> {
        let (width, height) = source.dimensions();
        debug!(
            "Loading {} plane {} as {}x{}",
            source.format(),
            source.plane(),
            width,
            height
        );
        self.load(source.path(), width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reshape_two_by_two() {
        let grid = SampleGrid::from_bytes(&[0, 128, 255, 64], 2, 2).unwrap();
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.view(), ndarray::arr2(&[[0u8, 128], [255, 64]]));
    }

    #[test]
    fn test_row_major_mapping() {
        let bytes: Vec<u8> = (0..=255).cycle().take(7 * 5).collect();
        let grid = SampleGrid::from_bytes(&bytes, 7, 5).unwrap();
        for r in 0..5 {
            for c in 0..7 {
                assert_eq!(grid.get(r, c), Some(bytes[r * 7 + c]));
            }
        }
        assert_eq!(grid.get(5, 0), None);
        assert_eq!(grid.to_vec(), bytes);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let grid = SampleGrid::from_bytes(&[1, 2, 3, 4, 5, 6], 2, 2).unwrap();
        assert_eq!(grid.to_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_short_buffer_is_shape_error() {
        let err = SampleGrid::from_bytes(&[1, 2, 3], 2, 2).unwrap_err();
        assert!(matches!(err, PlaneError::Shape { expected: 4, actual: 3 }));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            SampleGrid::from_bytes(&[1, 2], 0, 2),
            Err(PlaneError::InvalidDimensions { width: 0, height: 2 })
        ));
        assert!(matches!(
            PlaneLoader::new().load("/nonexistent/plane.y", 4, 0),
            Err(PlaneError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = PlaneLoader::new().load("/nonexistent/yuv_420p.y", 4, 4).unwrap_err();
        assert!(matches!(err, PlaneError::NotFound(_)));
    }

    #[test]
    fn test_unreadable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlaneLoader::new().load(dir.path(), 4, 4).unwrap_err();
        assert!(matches!(err, PlaneError::Io(_)), "got {:?}", err);
    }
}
