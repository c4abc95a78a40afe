//! vfx-draw - box and grid overlays for raw planar YUV video
//!
//! Reads packed frames, marks a border or a periodic grid on each of them
//! and writes the result, like the drawbox/drawgrid filters.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "vfx-draw")]
#[command(author, version, about = "Draw boxes and grids on raw planar YUV video")]
#[command(long_about = "
Draws a rectangular border or a periodic grid on every frame of a raw
planar YUV(A) video. Frames are read and written in packed layout
(Y plane, then U, V and alpha when present, rows without padding).

Examples:
  vfx-draw box in.yuv -o out.yuv -s 1920x1080 -x 100 -y 100 -w 640 -H 360
  vfx-draw box in.yuv -o out.yuv -s 1280x720 -t fill -c red@0.5
  vfx-draw grid in.yuv -o out.yuv -s 1280x720 -w 64 -H 64 -c invert
  vfx-draw grid - -o - -s 640x480 --pix-fmt yuva420p --config grid.yaml
  vfx-draw backends                         # List compute backends
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of threads for the CPU backend (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw a rectangular border (like drawbox)
    #[command(visible_alias = "b")]
    Box(DrawArgs),

    /// Draw a grid of horizontal and vertical lines (like drawgrid)
    #[command(visible_alias = "g")]
    Grid(DrawArgs),

    /// List compute backends and their availability
    Backends,
}

#[derive(Args, Clone, Debug, Default)]
struct DrawArgs {
    /// Input raw video ("-" for stdin)
    input: PathBuf,

    /// Output raw video ("-" for stdout)
    #[arg(short, long)]
    output: PathBuf,

    /// Frame size as WxH
    #[arg(short, long)]
    size: Option<String>,

    /// Pixel format (default: yuv420p)
    #[arg(long = "pix-fmt")]
    pix_fmt: Option<String>,

    /// Left edge of the box, or horizontal grid offset
    #[arg(short, allow_negative_numbers = true)]
    x: Option<i32>,

    /// Top edge of the box, or vertical grid offset
    #[arg(short, allow_negative_numbers = true)]
    y: Option<i32>,

    /// Box width, or horizontal grid period (0 = input width)
    #[arg(short, long)]
    width: Option<i32>,

    /// Box height, or vertical grid period (0 = input height)
    #[arg(short = 'H', long)]
    height: Option<i32>,

    /// Border or line thickness in pixels; "fill" fills the box
    #[arg(short, long)]
    thickness: Option<String>,

    /// Color: name, #RRGGBB[AA] or 0xRRGGBB[AA], optional @alpha; "invert" inverts luma
    #[arg(short, long)]
    color: Option<String>,

    /// Invert luma of marked pixels instead of painting
    #[arg(long)]
    invert: bool,

    /// Compute backend: auto, cpu, wgpu
    #[arg(long)]
    backend: Option<String>,

    /// YAML file with default options; command line values win
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    // stdout may carry video
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Box(args) => commands::draw::run(args, config::Shape::Box, cli.verbose),
        Commands::Grid(args) => commands::draw::run(args, config::Shape::Grid, cli.verbose),
        Commands::Backends => commands::backends::run(cli.verbose),
    }
}
