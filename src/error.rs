use std::path::PathBuf;
use thiserror::Error;

use crate::format::{PixelFormat, PlaneRole};

#[derive(Error, Debug)]
pub enum PlaneError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not enough samples: need {expected} bytes, have {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Plane {plane} does not belong to format {format}")]
    UnsupportedPlane { format: PixelFormat, plane: PlaneRole },

    #[error("Operation not supported for format {0}")]
    UnsupportedFormat(PixelFormat),

    #[error("Ratio must be within [0, 1], got {0}")]
    InvalidRatio(f32),

    #[error("Frame count must be at least 1, got {0}")]
    InvalidFrameCount(usize),

    #[error("Display unavailable: {0}")]
    Display(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, PlaneError>;
