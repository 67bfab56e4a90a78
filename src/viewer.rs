//! Grayscale rendering and presentation of sample grids
//!
//! Every plane is shown as raw intensity, one pixel per sample, with 0 as
//! black and 255 as white. Chroma and RGB channel planes are not colorized.

use crate::error::{PlaneError, Result};
use crate::loader::SampleGrid;
use image::{GrayImage, ImageFormat};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(0);

/// Somewhere a rendered image can be shown
pub trait DisplaySurface {
    fn present(&self, image: &GrayImage) -> Result<()>;
}

pub struct ViewerConfig {
    /// Program used to open the image instead of the host default
    pub command: Option<String>,
    /// Where rendered images are written before opening them
    pub temp_dir: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            command: None,
            temp_dir: std::env::temp_dir(),
        }
    }
}

/// Opens rendered images with the host's default image viewer
pub struct SystemViewer {
    config: ViewerConfig,
}

impl SystemViewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }

    fn program(&self) -> Result<String> {
        if let Some(command) = &self.config.command {
            return Ok(command.clone());
        }
        default_program()
    }

    fn next_image_path(&self) -> PathBuf {
        let id = NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed);
        self.config
            .temp_dir
            .join(format!("plane_view_{}_{}.png", std::process::id(), id))
    }
}

impl Default for SystemViewer {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl DisplaySurface for SystemViewer {
    fn present(&self, image: &GrayImage) -> Result<()> {
        let program = self.program()?;

        let path = self.next_image_path();
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| PlaneError::Display(format!("Failed to write {}: {}", path.display(), e)))?;
        debug!("Wrote {}", path.display());

        // Launchers hand off to the desktop viewer and return; the temp
        // image is left for that viewer to read.
        let status = Command::new(&program)
            .arg(&path)
            .status()
            .map_err(|e| PlaneError::Display(format!("Failed to launch {}: {}", program, e)))?;
        if !status.success() {
            return Err(PlaneError::Display(format!("{} exited with {}", program, status)));
        }

        info!("Opened {} with {}", path.display(), program);
        Ok(())
    }
}

#[cfg(target_os = "windows")]
fn default_program() -> Result<String> {
    Ok("explorer".to_string())
}

#[cfg(target_os = "macos")]
fn default_program() -> Result<String> {
    Ok("open".to_string())
}

/// Whether an X11 or Wayland session is reachable, given an env lookup
#[cfg_attr(not(all(unix, not(target_os = "macos"))), allow(dead_code))]
fn has_graphical_session(lookup: impl Fn(&str) -> Option<OsString>) -> bool {
    ["DISPLAY", "WAYLAND_DISPLAY"]
        .iter()
        .any(|var| lookup(var).map_or(false, |v| !v.is_empty()))
}

#[cfg(all(unix, not(target_os = "macos")))]
fn default_program() -> Result<String> {
    if !has_graphical_session(|var| std::env::var_os(var)) {
        return Err(PlaneError::Display(
            "no DISPLAY or WAYLAND_DISPLAY set (headless session)".to_string(),
        ));
    }
    Ok("xdg-open".to_string())
}

#[cfg(not(any(unix, target_os = "windows")))]
fn default_program() -> Result<String> {
    Err(PlaneError::Display("no default image viewer on this platform".to_string()))
}

/// Render a grid as an 8-bit grayscale image, one pixel per sample
pub fn render(grid: &SampleGrid) -> Result<GrayImage> {
    let (width, height) = (grid.width(), grid.height());
    let invalid = || PlaneError::InvalidDimensions { width, height };

    let w = u32::try_from(width).map_err(|_| invalid())?;
    let h = u32::try_from(height).map_err(|_| invalid())?;
    GrayImage::from_raw(w, h, grid.to_vec()).ok_or_else(invalid)
}

pub struct Viewer<S: DisplaySurface = SystemViewer> {
    surface: S,
}

impl Viewer<SystemViewer> {
    pub fn system(config: ViewerConfig) -> Self {
        Self::new(SystemViewer::new(config))
    }
}

impl<S: DisplaySurface> Viewer<S> {
    pub fn new(surface: S) -> Self {
        Self { surface }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Render `grid` and present it. The grid is only borrowed.
    pub fn show(&self, grid: &SampleGrid) -> Result<()> {
        let image = render(grid)?;
        info!("Showing {}x{} plane", grid.width(), grid.height());
        self.surface.present(&image)
    }

    /// Render `grid` to a PNG file instead of displaying it
    pub fn save(&self, grid: &SampleGrid, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        render(grid)?.save_with_format(path, ImageFormat::Png)?;
        info!("Saved {}x{} plane to {}", grid.width(), grid.height(), path.display());
        Ok(())
    }
}
