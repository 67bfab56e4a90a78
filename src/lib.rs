//! plane_view - viewer for raw, headerless planar pixel dumps
//!
//! Loads one plane of a YUV420P, YUV444P, RGB888 or grayscale dump as a 2D
//! grid of 8-bit samples and shows it as a grayscale image.

mod error;
mod extract;
mod format;
mod loader;
mod viewer;

pub use error::{PlaneError, Result};
pub use extract::{
    extract_planes, neutralize_chroma, plane_file_name, reduce_luma, scale_luma, split_frame,
    to_gray, FrameLayout, NEUTRAL_CHROMA,
};
pub use format::{PixelFormat, PlaneGeometry, PlaneRole, RawPlaneSource};
pub use loader::{PlaneLoader, SampleGrid};
pub use viewer::{render, DisplaySurface, SystemViewer, Viewer, ViewerConfig};
