//! Box and grid commands
//!
//! Reads packed frames, draws the overlay on each one and writes the
//! result in the same layout. One request serves the whole stream.

use crate::DrawArgs;
use crate::config::{DrawOptions, Shape};
use anyhow::{Context, Result};
use std::io::{Read, Write};
use tracing::{debug, info, trace};
use vfx_core::{Frame, PixelFormat};
use vfx_draw::{DrawRequest, FrameProcessor, create_engine};

pub fn run(args: DrawArgs, shape: Shape, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), output = %args.output.display(), ?shape, "draw::run");

    let options = resolve_options(&args)?;
    let (width, height) = options.frame_size()?;
    let format = options.pixel_format()?;
    let request = options.request(shape, width, height)?;
    let backend = options.backend()?;

    let mut engine = create_engine(backend).context("Failed to initialize draw engine")?;
    info!(backend = engine.backend_name(), %format, width, height, ?request, "Drawing");

    if verbose > 0 {
        eprintln!(
            "Drawing {:?} on {}x{} {} ({} backend)",
            request.mode,
            width,
            height,
            format,
            engine.backend_name()
        );
    }

    let mut input = super::open_input(&args.input)?;
    let mut output = super::open_output(&args.output)?;
    let frames = process_stream(engine.as_mut(), &mut input, &mut output, format, width, height, &request)?;
    engine.uninit();

    let bytes = frames * format.packed_frame_size(width, height) as u64;
    info!(frames, bytes, "Done");
    if verbose > 0 {
        eprintln!("Processed {} frames ({})", frames, super::format_size(bytes));
    }

    Ok(())
}

/// File options first, then command-line values on top.
fn resolve_options(args: &DrawArgs) -> Result<DrawOptions> {
    let cli = DrawOptions::from_args(args)?;
    match &args.config {
        Some(path) => {
            debug!(config = %path.display(), "loading config");
            Ok(DrawOptions::load(path)?.merge(cli))
        }
        None => Ok(cli),
    }
}

/// Draws `request` on every frame of `input`. Returns the frame count.
///
/// A trailing partial frame is an error; an empty input yields zero frames.
pub fn process_stream<R: Read, W: Write>(
    engine: &mut dyn FrameProcessor,
    input: &mut R,
    output: &mut W,
    format: PixelFormat,
    width: u32,
    height: u32,
    request: &DrawRequest,
) -> Result<u64> {
    let mut out = Frame::new(format, width, height)?;
    let mut count = 0u64;

    while let Some(frame) =
        Frame::read_from(input, format, width, height).with_context(|| format!("Failed to read frame {count}"))?
    {
        engine
            .process_into(&frame, &mut out, request)
            .with_context(|| format!("Failed to draw frame {count}"))?;
        out.write_to(output)
            .with_context(|| format!("Failed to write frame {count}"))?;
        count += 1;
        trace!(frame = count, "frame written");
    }

    output.flush().context("Failed to flush output")?;
    Ok(count)
}
