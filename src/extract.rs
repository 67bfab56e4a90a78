//! Plane extraction from raw frame files
//!
//! Produces the per-plane dumps the viewer reads. Source files are sequences
//! of frames with no header. YUV frames are planar (all Y, then U, then V);
//! RGB888 frames are packed `R,G,B` triplets.

use crate::error::{PlaneError, Result};
use crate::format::{PixelFormat, PlaneRole};
use crate::loader::{read_bytes, SampleGrid};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Neutral chroma value; a YUV frame with both chroma planes at 128 is gray
pub const NEUTRAL_CHROMA: u8 = 128;

/// Byte layout of one frame of a raw source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub format: PixelFormat,
    pub width: usize,
    pub height: usize,
}

impl FrameLayout {
    /// Fails with `InvalidDimensions` for an empty plane or a frame whose
    /// byte size does not fit in `usize`. YUV420P needs at least 2x2 so its
    /// chroma planes are not empty.
    pub fn new(format: PixelFormat, width: usize, height: usize) -> Result<Self> {
        let invalid = PlaneError::InvalidDimensions { width, height };
        let min = if format == PixelFormat::Yuv420p { 2 } else { 1 };
        if width < min || height < min {
            return Err(invalid);
        }
        width
            .checked_mul(height)
            .and_then(|luma| luma.checked_mul(format.planes().len()))
            .ok_or(invalid)?;
        Ok(Self { format, width, height })
    }

    pub fn plane_dimensions(&self, plane: PlaneRole) -> (usize, usize) {
        self.format.plane_dimensions(plane, self.width, self.height)
    }

    pub fn plane_size(&self, plane: PlaneRole) -> usize {
        let (w, h) = self.plane_dimensions(plane);
        w * h
    }

    /// Luma (or single channel) bytes at the start of a planar frame
    pub fn luma_size(&self) -> usize {
        self.width * self.height
    }

    pub fn frame_size(&self) -> usize {
        self.format
            .planes()
            .iter()
            .map(|&plane| self.plane_size(plane))
            .sum()
    }
}

/// Bytes of frame `index` within `bytes`
fn frame_bytes<'a>(bytes: &'a [u8], layout: &FrameLayout, index: usize) -> Result<&'a [u8]> {
    let size = layout.frame_size();
    let end = index.saturating_add(1).saturating_mul(size);
    let start = end - size;
    if bytes.len() < end {
        return Err(PlaneError::Shape {
            expected: end,
            actual: bytes.len(),
        });
    }
    Ok(&bytes[start..end])
}

fn check_frame_count(count: usize) -> Result<()> {
    if count == 0 {
        return Err(PlaneError::InvalidFrameCount(count));
    }
    Ok(())
}

/// Split frame `index` of `bytes` into one grid per plane, in plane order
pub fn split_frame(
    bytes: &[u8],
    layout: &FrameLayout,
    index: usize,
) -> Result<Vec<(PlaneRole, SampleGrid)>> {
    let frame = frame_bytes(bytes, layout, index)?;

    match layout.format {
        PixelFormat::Rgb888 => {
            let mut channels = [Vec::new(), Vec::new(), Vec::new()];
            for channel in channels.iter_mut() {
                channel.reserve(layout.luma_size());
            }
            for px in frame.chunks_exact(3) {
                for (channel, &sample) in channels.iter_mut().zip(px) {
                    channel.push(sample);
                }
            }

            PixelFormat::Rgb888
                .planes()
                .iter()
                .zip(channels.iter())
                .map(|(&plane, samples)| {
                    let grid = SampleGrid::from_bytes(samples, layout.width, layout.height)?;
                    Ok((plane, grid))
                })
                .collect()
        }
        format => {
            let mut offset = 0;
            let mut planes = Vec::with_capacity(format.planes().len());
            for &plane in format.planes() {
                let (w, h) = layout.plane_dimensions(plane);
                let size = w * h;
                let grid = SampleGrid::from_bytes(&frame[offset..offset + size], w, h)?;
                planes.push((plane, grid));
                offset += size;
            }
            Ok(planes)
        }
    }
}

/// File name of a plane dump, e.g. `yuv_420p.u`
pub fn plane_file_name(format: PixelFormat, plane: PlaneRole) -> String {
    format!("{}.{}", format.file_stem(), plane.extension())
}

/// Write the planes of frames `first..first + count` of `input` into `out_dir`.
///
/// Each plane dump holds that plane of every frame, one after another.
pub fn extract_planes(
    input: impl AsRef<Path>,
    layout: &FrameLayout,
    first: usize,
    count: usize,
    out_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>> {
    check_frame_count(count)?;
    let input = input.as_ref();
    let out_dir = out_dir.as_ref();
    let bytes = read_bytes(input)?;

    let planes = layout.format.planes();
    let mut dumps: Vec<Vec<u8>> = vec![Vec::new(); planes.len()];
    for index in first..first.saturating_add(count) {
        for (dump, (_, grid)) in dumps.iter_mut().zip(split_frame(&bytes, layout, index)?) {
            dump.extend(grid.to_vec());
        }
    }

    std::fs::create_dir_all(out_dir)?;
    let mut written = Vec::with_capacity(planes.len());
    for (&plane, dump) in planes.iter().zip(&dumps) {
        let path = out_dir.join(plane_file_name(layout.format, plane));
        std::fs::write(&path, dump)?;
        debug!("Wrote {} ({} bytes)", path.display(), dump.len());
        written.push(path);
    }

    info!(
        "Extracted {} planes from frames {}..{} of {}",
        written.len(),
        first,
        first.saturating_add(count),
        input.display()
    );
    Ok(written)
}

fn require_yuv(layout: &FrameLayout) -> Result<()> {
    if layout.format.is_yuv() {
        Ok(())
    } else {
        Err(PlaneError::UnsupportedFormat(layout.format))
    }
}

/// Set both chroma planes of a planar YUV frame to [`NEUTRAL_CHROMA`]
pub fn neutralize_chroma(frame: &mut [u8], layout: &FrameLayout) -> Result<()> {
    require_yuv(layout)?;
    let luma = layout.luma_size();
    let end = layout.frame_size();
    if frame.len() < end {
        return Err(PlaneError::Shape {
            expected: end,
            actual: frame.len(),
        });
    }
    frame[luma..end].fill(NEUTRAL_CHROMA);
    Ok(())
}

/// Multiply every luma sample of a planar YUV frame by `ratio`
pub fn scale_luma(frame: &mut [u8], layout: &FrameLayout, ratio: f32) -> Result<()> {
    require_yuv(layout)?;
    if !(0.0..=1.0).contains(&ratio) {
        return Err(PlaneError::InvalidRatio(ratio));
    }
    let luma = layout.luma_size();
    if frame.len() < luma {
        return Err(PlaneError::Shape {
            expected: luma,
            actual: frame.len(),
        });
    }
    for sample in &mut frame[..luma] {
        *sample = (*sample as f32 * ratio) as u8;
    }
    Ok(())
}

fn edit_frames(
    input: &Path,
    layout: &FrameLayout,
    first: usize,
    count: usize,
    output: &Path,
    edit: impl Fn(&mut [u8]) -> Result<()>,
) -> Result<()> {
    check_frame_count(count)?;
    let bytes = read_bytes(input)?;
    let mut edited = Vec::new();
    for index in first..first.saturating_add(count) {
        let mut frame = frame_bytes(&bytes, layout, index)?.to_vec();
        edit(&mut frame)?;
        edited.extend_from_slice(&frame);
    }
    std::fs::write(output, &edited)?;
    Ok(())
}

/// Write frames `first..first + count` of `input` with neutral chroma,
/// leaving only luma visible
pub fn to_gray(
    input: impl AsRef<Path>,
    layout: &FrameLayout,
    first: usize,
    count: usize,
    output: impl AsRef<Path>,
) -> Result<()> {
    require_yuv(layout)?;
    let (input, output) = (input.as_ref(), output.as_ref());
    edit_frames(input, layout, first, count, output, |frame| {
        neutralize_chroma(frame, layout)
    })?;
    info!("Wrote {} gray frames of {} to {}", count, input.display(), output.display());
    Ok(())
}

/// Write frames `first..first + count` of `input` with luma scaled by `ratio`
pub fn reduce_luma(
    input: impl AsRef<Path>,
    layout: &FrameLayout,
    first: usize,
    count: usize,
    ratio: f32,
    output: impl AsRef<Path>,
) -> Result<()> {
    require_yuv(layout)?;
    if !(0.0..=1.0).contains(&ratio) {
        return Err(PlaneError::InvalidRatio(ratio));
    }
    let (input, output) = (input.as_ref(), output.as_ref());
    edit_frames(input, layout, first, count, output, |frame| {
        scale_luma(frame, layout, ratio)
    })?;
    info!(
        "Wrote {} frames of {} with luma x{} to {}",
        count,
        input.display(),
        ratio,
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 256) as u8).collect()
    }

    #[test]
    fn test_frame_sizes() {
        let l = FrameLayout::new(PixelFormat::Yuv420p, 256, 256).unwrap();
        assert_eq!(l.frame_size(), 256 * 256 * 3 / 2);
        assert_eq!(l.plane_size(PlaneRole::U), 256 * 256 / 4);
        let l = FrameLayout::new(PixelFormat::Yuv444p, 256, 256).unwrap();
        assert_eq!(l.frame_size(), 256 * 256 * 3);
        let l = FrameLayout::new(PixelFormat::Rgb888, 500, 500).unwrap();
        assert_eq!(l.frame_size(), 750_000);
        let l = FrameLayout::new(PixelFormat::Gray, 4, 4).unwrap();
        assert_eq!(l.frame_size(), 16);
        assert!(FrameLayout::new(PixelFormat::Gray, 0, 4).is_err());
    }

    #[test]
    fn test_split_yuv420p() {
        let layout = FrameLayout::new(PixelFormat::Yuv420p, 4, 2).unwrap();
        let bytes = ramp(layout.frame_size());
        let planes = split_frame(&bytes, &layout, 0).unwrap();

        assert_eq!(planes.len(), 3);
        let (role, y) = &planes[0];
        assert_eq!(*role, PlaneRole::Y);
        assert_eq!((y.width(), y.height()), (4, 2));
        assert_eq!(y.to_vec(), (0..8).collect::<Vec<u8>>());
        let (role, u) = &planes[1];
        assert_eq!(*role, PlaneRole::U);
        assert_eq!((u.width(), u.height()), (2, 1));
        assert_eq!(u.to_vec(), vec![8, 9]);
        assert_eq!(planes[2].1.to_vec(), vec![10, 11]);
    }

    #[test]
    fn test_split_selects_frame() {
        let layout = FrameLayout::new(PixelFormat::Yuv444p, 2, 1).unwrap();
        let bytes = ramp(layout.frame_size() * 2);
        let planes = split_frame(&bytes, &layout, 1).unwrap();
        assert_eq!(planes[0].1.to_vec(), vec![6, 7]);
        assert_eq!(planes[1].1.to_vec(), vec![8, 9]);
        assert_eq!(planes[2].1.to_vec(), vec![10, 11]);

        let err = split_frame(&bytes, &layout, 2).unwrap_err();
        assert!(matches!(err, PlaneError::Shape { expected: 18, actual: 12 }));
    }

    #[test]
    fn test_split_packed_rgb() {
        let layout = FrameLayout::new(PixelFormat::Rgb888, 2, 1).unwrap();
        let bytes = [10, 20, 30, 11, 21, 31];
        let planes = split_frame(&bytes, &layout, 0).unwrap();
        let roles: Vec<_> = planes.iter().map(|(r, _)| *r).collect();
        assert_eq!(roles, vec![PlaneRole::R, PlaneRole::G, PlaneRole::B]);
        assert_eq!(planes[0].1.to_vec(), vec![10, 11]);
        assert_eq!(planes[1].1.to_vec(), vec![20, 21]);
        assert_eq!(planes[2].1.to_vec(), vec![30, 31]);
    }

    #[test]
    fn test_neutralize_chroma_keeps_luma() {
        let layout = FrameLayout::new(PixelFormat::Yuv420p, 2, 2).unwrap();
        let mut frame = vec![1, 2, 3, 4, 5, 6];
        neutralize_chroma(&mut frame, &layout).unwrap();
        assert_eq!(frame, vec![1, 2, 3, 4, 128, 128]);
    }

    #[test]
    fn test_scale_luma() {
        let layout = FrameLayout::new(PixelFormat::Yuv420p, 2, 2).unwrap();
        let mut frame = vec![200, 101, 0, 255, 50, 60];
        scale_luma(&mut frame, &layout, 0.5).unwrap();
        assert_eq!(frame, vec![100, 50, 0, 127, 50, 60]);

        assert!(matches!(
            scale_luma(&mut frame, &layout, 1.5),
            Err(PlaneError::InvalidRatio(_))
        ));
    }

    #[test]
    fn test_edits_require_yuv() {
        let layout = FrameLayout::new(PixelFormat::Rgb888, 1, 1).unwrap();
        let mut frame = vec![1, 2, 3];
        assert!(matches!(
            neutralize_chroma(&mut frame, &layout),
            Err(PlaneError::UnsupportedFormat(PixelFormat::Rgb888))
        ));
    }

    #[test]
    fn test_layout_rejects_overflow_and_empty_chroma() {
        assert!(matches!(
            FrameLayout::new(PixelFormat::Rgb888, 1 << 33, 1 << 33),
            Err(PlaneError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            FrameLayout::new(PixelFormat::Yuv420p, 1, 16),
            Err(PlaneError::InvalidDimensions { width: 1, height: 16 })
        ));
        assert!(FrameLayout::new(PixelFormat::Yuv444p, 1, 1).is_ok());
        assert!(FrameLayout::new(PixelFormat::Yuv420p, 2, 2).is_ok());
    }

    #[test]
    fn test_plane_file_names() {
        assert_eq!(plane_file_name(PixelFormat::Yuv420p, PlaneRole::U), "yuv_420p.u");
        assert_eq!(plane_file_name(PixelFormat::Rgb888, PlaneRole::B), "rgb_888.b");
    }
}
