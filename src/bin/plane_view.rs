// plane_view - raw plane dump viewer
// Shows one plane of a headerless pixel dump, or splits raw frames into plane dumps

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plane_view::{
    extract_planes, reduce_luma, to_gray, FrameLayout, PixelFormat, PlaneLoader, PlaneRole,
    RawPlaneSource, Viewer, ViewerConfig,
};

#[derive(Parser)]
#[command(name = "plane_view", version, about = "Viewer for raw planar pixel dumps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one plane dump as a grayscale image
    Show {
        #[command(flatten)]
        source: SourceArgs,

        /// Save the rendered plane as PNG instead of opening a viewer
        #[arg(long)]
        output: Option<PathBuf>,

        /// Program used to open the image (default: host image viewer)
        #[arg(long)]
        viewer: Option<String>,
    },

    /// Print the resolved plane geometry as JSON
    Describe {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Split frames of a raw file into per-plane dumps
    Extract {
        #[command(flatten)]
        frame: FrameArgs,

        /// Pixel format of the input frames
        #[arg(long)]
        format: PixelFormat,

        /// Directory for the plane dumps
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
    },

    /// Write YUV420P frames with neutral chroma
    Gray {
        #[command(flatten)]
        frame: FrameArgs,

        #[arg(long, default_value = "yuv_420p.gray")]
        output: PathBuf,
    },

    /// Write YUV420P frames with attenuated luma
    ReduceLuma {
        #[command(flatten)]
        frame: FrameArgs,

        /// Luma multiplier in [0, 1]
        #[arg(long, default_value_t = 0.5)]
        ratio: f32,

        #[arg(long, default_value = "yuv_420p.y_reduce")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Plane dump file, e.g. out/yuv_420p.u
    path: PathBuf,

    /// Base (luma) width of the picture
    #[arg(long, default_value_t = 256)]
    width: usize,

    /// Base (luma) height of the picture
    #[arg(long, default_value_t = 256)]
    height: usize,

    /// Pixel format (default: inferred from the file name)
    #[arg(long, requires = "plane")]
    format: Option<PixelFormat>,

    /// Plane within the format
    #[arg(long, requires = "format")]
    plane: Option<PlaneRole>,
}

impl SourceArgs {
    fn resolve(&self) -> plane_view::Result<RawPlaneSource> {
        match (self.format, self.plane) {
            (Some(format), Some(plane)) => {
                RawPlaneSource::new(&self.path, format, plane, self.width, self.height)
            }
            _ => RawPlaneSource::infer(&self.path, self.width, self.height),
        }
    }
}

#[derive(Args)]
struct FrameArgs {
    /// Raw frame file
    input: PathBuf,

    #[arg(long, default_value_t = 256)]
    width: usize,

    #[arg(long, default_value_t = 256)]
    height: usize,

    /// Zero-based index of the first frame
    #[arg(long, default_value_t = 0)]
    frame: usize,

    /// Number of consecutive frames to process
    #[arg(long, default_value_t = 1)]
    frames: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show { source, output, viewer } => {
            let source = source.resolve().context("Invalid plane selection")?;
            let grid = PlaneLoader::new()
                .load_source(&source)
                .with_context(|| format!("Failed to load {}", source.path().display()))?;

            let viewer = Viewer::system(ViewerConfig {
                command: viewer,
                ..ViewerConfig::default()
            });
            match output {
                Some(path) => viewer
                    .save(&grid, &path)
                    .with_context(|| format!("Failed to save {}", path.display()))?,
                None => viewer.show(&grid).context("Failed to show plane")?,
            }
        }
        Commands::Describe { source } => {
            let source = source.resolve().context("Invalid plane selection")?;
            let json = serde_json::to_string_pretty(&source.geometry())
                .context("Failed to serialize geometry")?;
            println!("{}", json);
        }
        Commands::Extract { frame, format, out_dir } => {
            let layout = FrameLayout::new(format, frame.width, frame.height)?;
            let written = extract_planes(&frame.input, &layout, frame.frame, frame.frames, &out_dir)
                .with_context(|| format!("Failed to extract planes from {}", frame.input.display()))?;
            for path in written {
                info!("   ✓ {}", path.display());
            }
        }
        Commands::Gray { frame, output } => {
            let layout = FrameLayout::new(PixelFormat::Yuv420p, frame.width, frame.height)?;
            to_gray(&frame.input, &layout, frame.frame, frame.frames, &output)
                .with_context(|| format!("Failed to convert {}", frame.input.display()))?;
        }
        Commands::ReduceLuma { frame, ratio, output } => {
            let layout = FrameLayout::new(PixelFormat::Yuv420p, frame.width, frame.height)?;
            reduce_luma(&frame.input, &layout, frame.frame, frame.frames, ratio, &output)
                .with_context(|| format!("Failed to reduce luma of {}", frame.input.display()))?;
        }
    }

    Ok(())
}
