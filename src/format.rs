//! Pixel formats, plane roles and the geometry of raw plane dumps
//!
//! A dump file holds exactly one plane. Its sample grid size depends on the
//! pixel format and on which plane it is: chroma planes of YUV420P are half
//! width and half height, everything else is full resolution.

use crate::error::{PlaneError, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Pixel format of the pipeline output a dump was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Yuv420p,
    Yuv444p,
    Rgb888,
    Gray,
}

impl PixelFormat {
    pub fn as_str(&self) -> &str {
        match self {
            PixelFormat::Yuv420p => "yuv420p",
            PixelFormat::Yuv444p => "yuv444p",
            PixelFormat::Rgb888 => "rgb888",
            PixelFormat::Gray => "gray",
        }
    }

    /// File stem used for plane dumps, e.g. `yuv_420p` in `yuv_420p.u`
    pub fn file_stem(&self) -> &str {
        match self {
            PixelFormat::Yuv420p => "yuv_420p",
            PixelFormat::Yuv444p => "yuv_444p",
            PixelFormat::Rgb888 => "rgb_888",
            PixelFormat::Gray => "gray",
        }
    }

    pub fn planes(&self) -> &'static [PlaneRole] {
        match self {
            PixelFormat::Yuv420p | PixelFormat::Yuv444p => &[PlaneRole::Y, PlaneRole::U, PlaneRole::V],
            PixelFormat::Rgb888 => &[PlaneRole::R, PlaneRole::G, PlaneRole::B],
            PixelFormat::Gray => &[PlaneRole::Gray],
        }
    }

    pub fn has_plane(&self, plane: PlaneRole) -> bool {
        self.planes().contains(&plane)
    }

    pub fn is_yuv(&self) -> bool {
        matches!(self, PixelFormat::Yuv420p | PixelFormat::Yuv444p)
    }

    /// Width and height of `plane` for a base resolution of `width` x `height`
    pub fn plane_dimensions(&self, plane: PlaneRole, width: usize, height: usize) -> (usize, usize) {
        match (self, plane) {
            (PixelFormat::Yuv420p, PlaneRole::U | PlaneRole::V) => (width / 2, height / 2),
            _ => (width, height),
        }
    }

    fn from_file_stem(stem: &str) -> Option<Self> {
        [
            PixelFormat::Yuv420p,
            PixelFormat::Yuv444p,
            PixelFormat::Rgb888,
            PixelFormat::Gray,
        ]
        .into_iter()
        .find(|f| f.file_stem() == stem)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "yuv420p" | "yuv420" | "i420" => Ok(PixelFormat::Yuv420p),
            "yuv444p" | "yuv444" => Ok(PixelFormat::Yuv444p),
            "rgb888" | "rgb24" | "rgb" => Ok(PixelFormat::Rgb888),
            "gray" | "grey" | "y8" => Ok(PixelFormat::Gray),
            _ => Err(format!("unknown pixel format: {}", s)),
        }
    }
}

/// Which channel of the pixel format a plane carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaneRole {
    Y,
    U,
    V,
    R,
    G,
    B,
    Gray,
}

impl PlaneRole {
    /// File extension used for plane dumps
    pub fn extension(&self) -> &str {
        match self {
            PlaneRole::Y => "y",
            PlaneRole::U => "u",
            PlaneRole::V => "v",
            PlaneRole::R => "r",
            PlaneRole::G => "g",
            PlaneRole::B => "b",
            PlaneRole::Gray => "gray",
        }
    }
}

impl fmt::Display for PlaneRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for PlaneRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "y" => Ok(PlaneRole::Y),
            "u" | "cb" => Ok(PlaneRole::U),
            "v" | "cr" => Ok(PlaneRole::V),
            "r" => Ok(PlaneRole::R),
            "g" => Ok(PlaneRole::G),
            "b" => Ok(PlaneRole::B),
            "gray" | "grey" => Ok(PlaneRole::Gray),
            _ => Err(format!("unknown plane: {}", s)),
        }
    }
}

/// A raw plane dump together with the format knowledge needed to reshape it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPlaneSource {
    path: PathBuf,
    format: PixelFormat,
    plane: PlaneRole,
    base_width: usize,
    base_height: usize,
}

/// Resolved geometry of a plane, as reported by `plane_view describe`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaneGeometry {
    pub path: PathBuf,
    pub format: PixelFormat,
    pub plane: PlaneRole,
    pub width: usize,
    pub height: usize,
    pub byte_len: usize,
}

impl RawPlaneSource {
    pub fn new(
        path: impl Into<PathBuf>,
        format: PixelFormat,
        plane: PlaneRole,
        base_width: usize,
        base_height: usize,
    ) -> Result<Self> {
        if !format.has_plane(plane) {
            return Err(PlaneError::UnsupportedPlane { format, plane });
        }
        if base_width.checked_mul(base_height).is_none() {
            return Err(PlaneError::InvalidDimensions {
                width: base_width,
                height: base_height,
            });
        }
        Ok(Self {
            path: path.into(),
            format,
            plane,
            base_width,
            base_height,
        })
    }

    /// Infer format and plane from a dump file name such as `yuv_420p.u`.
    ///
    /// A `.gray` file, or any name that does not follow the dump naming,
    /// is treated as a full resolution grayscale plane.
    pub fn infer(path: impl Into<PathBuf>, base_width: usize, base_height: usize) -> Result<Self> {
        let path = path.into();
        let (format, plane) = infer_format_and_plane(&path);
        debug!("Inferred {} plane {} from {}", format, plane, path.display());
        Self::new(path, format, plane, base_width, base_height)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn plane(&self) -> PlaneRole {
        self.plane
    }

    /// Width and height of the sample grid stored in this dump
    pub fn dimensions(&self) -> (usize, usize) {
        self.format
            .plane_dimensions(self.plane, self.base_width, self.base_height)
    }

    pub fn byte_len(&self) -> usize {
        let (w, h) = self.dimensions();
        w * h
    }

    pub fn geometry(&self) -> PlaneGeometry {
        let (width, height) = self.dimensions();
        PlaneGeometry {
            path: self.path.clone(),
            format: self.format,
            plane: self.plane,
            width,
            height,
            byte_len: width * height,
        }
    }
}

fn infer_format_and_plane(path: &Path) -> (PixelFormat, PlaneRole) {
    let fallback = (PixelFormat::Gray, PlaneRole::Gray);

    let stem = path.file_stem().and_then(|s| s.to_str());
    let ext = path.extension().and_then(|s| s.to_str());
    let (Some(stem), Some(ext)) = (stem, ext) else {
        return fallback;
    };

    let Ok(plane) = ext.parse::<PlaneRole>() else {
        return fallback;
    };
    if plane == PlaneRole::Gray {
        return fallback;
    }

    match PixelFormat::from_file_stem(stem) {
        Some(format) if format.has_plane(plane) => (format, plane),
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_dimensions_table() {
        let (w, h) = (256, 256);
        assert_eq!(PixelFormat::Yuv420p.plane_dimensions(PlaneRole::Y, w, h), (256, 256));
        assert_eq!(PixelFormat::Yuv420p.plane_dimensions(PlaneRole::U, w, h), (128, 128));
        assert_eq!(PixelFormat::Yuv420p.plane_dimensions(PlaneRole::V, w, h), (128, 128));
        for plane in [PlaneRole::Y, PlaneRole::U, PlaneRole::V] {
            assert_eq!(PixelFormat::Yuv444p.plane_dimensions(plane, w, h), (256, 256));
        }
        for plane in [PlaneRole::R, PlaneRole::G, PlaneRole::B] {
            assert_eq!(PixelFormat::Rgb888.plane_dimensions(plane, 500, 500), (500, 500));
        }
        assert_eq!(PixelFormat::Gray.plane_dimensions(PlaneRole::Gray, w, h), (256, 256));
    }

    #[test]
    fn test_odd_chroma_dimensions_round_down() {
        assert_eq!(PixelFormat::Yuv420p.plane_dimensions(PlaneRole::U, 5, 3), (2, 1));
    }

    #[test]
    fn test_plane_must_belong_to_format() {
        let err = RawPlaneSource::new("x", PixelFormat::Rgb888, PlaneRole::U, 4, 4).unwrap_err();
        assert!(matches!(
            err,
            PlaneError::UnsupportedPlane { format: PixelFormat::Rgb888, plane: PlaneRole::U }
        ));
    }

    #[test]
    fn test_oversized_base_resolution_rejected() {
        let err = RawPlaneSource::new("a.y", PixelFormat::Yuv444p, PlaneRole::Y, 1 << 33, 1 << 33)
            .unwrap_err();
        assert!(matches!(err, PlaneError::InvalidDimensions { .. }));
        assert!(RawPlaneSource::infer("rgb_888.r", usize::MAX, 2).is_err());
    }

    #[test]
    fn test_infer_from_dump_names() {
        let src = RawPlaneSource::infer("out/yuv_420p.u", 256, 256).unwrap();
        assert_eq!(src.format(), PixelFormat::Yuv420p);
        assert_eq!(src.plane(), PlaneRole::U);
        assert_eq!(src.dimensions(), (128, 128));

        let src = RawPlaneSource::infer("./out/rgb_888.g", 500, 500).unwrap();
        assert_eq!(src.format(), PixelFormat::Rgb888);
        assert_eq!(src.plane(), PlaneRole::G);
        assert_eq!(src.byte_len(), 250_000);

        let src = RawPlaneSource::infer("out/yuv_420p.gray", 256, 256).unwrap();
        assert_eq!(src.format(), PixelFormat::Gray);
        assert_eq!(src.dimensions(), (256, 256));
    }

    #[test]
    fn test_infer_unknown_name_falls_back_to_gray() {
        for name in ["dump.bin", "noext", "frame.u", "rgb_888.y"] {
            let src = RawPlaneSource::infer(name, 16, 8).unwrap();
            assert_eq!(src.format(), PixelFormat::Gray, "{}", name);
            assert_eq!(src.dimensions(), (16, 8));
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("YUV_420P".parse::<PixelFormat>().unwrap(), PixelFormat::Yuv420p);
        assert_eq!("rgb24".parse::<PixelFormat>().unwrap(), PixelFormat::Rgb888);
        assert_eq!("Cr".parse::<PlaneRole>().unwrap(), PlaneRole::V);
        assert!("nv12".parse::<PixelFormat>().is_err());
    }

    #[test]
    fn test_geometry_serializes() {
        let src = RawPlaneSource::new("a.v", PixelFormat::Yuv420p, PlaneRole::V, 64, 32).unwrap();
        let json = serde_json::to_value(src.geometry()).unwrap();
        assert_eq!(json["format"], "yuv420p");
        assert_eq!(json["plane"], "v");
        assert_eq!(json["width"], 32);
        assert_eq!(json["height"], 16);
        assert_eq!(json["byte_len"], 512);
    }
}
