//! Draw options from the command line and YAML config files.
//!
//! Both sources fill the same [`DrawOptions`]; command-line values override
//! file values field by field. The merged options are then resolved against
//! the frame size into a [`DrawRequest`].
//!
//! ```yaml
//! size: 1280x720
//! pix_fmt: yuv420p
//! x: 100
//! y: 50
//! width: 320
//! height: 180
//! thickness: fill      # or a pixel count
//! color: red@0.5       # or "invert"
//! backend: cpu
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::str::FromStr;
use vfx_core::{PixelFormat, Rgba8, YuvaColor};
use vfx_draw::request::{DEFAULT_BOX_THICKNESS, DEFAULT_GRID_THICKNESS};
use vfx_draw::{Backend, BoxGeometry, DrawRequest, GridGeometry};

use crate::DrawArgs;

/// Overlay kind selected by the subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Box,
    Grid,
}

/// Thickness option: a pixel count or `fill`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thickness {
    Pixels(i32),
    Fill,
}

impl FromStr for Thickness {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("fill") {
            return Ok(Self::Fill);
        }
        let pixels = s
            .parse()
            .with_context(|| format!("invalid thickness '{s}': expected a pixel count or 'fill'"))?;
        Ok(Self::Pixels(pixels))
    }
}

impl<'de> Deserialize<'de> for Thickness {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Pixels(i32),
            Keyword(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Pixels(pixels) => Ok(Self::Pixels(pixels)),
            Raw::Keyword(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Unresolved draw options. `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrawOptions {
    pub size: Option<String>,
    #[serde(alias = "pix-fmt")]
    pub pix_fmt: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub thickness: Option<Thickness>,
    pub color: Option<String>,
    pub invert: Option<bool>,
    pub backend: Option<String>,
}

impl DrawOptions {
    /// Loads options from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Options given on the command line.
    pub fn from_args(args: &DrawArgs) -> Result<Self> {
        Ok(Self {
            size: args.size.clone(),
            pix_fmt: args.pix_fmt.clone(),
            x: args.x,
            y: args.y,
            width: args.width,
            height: args.height,
            thickness: args.thickness.as_deref().map(str::parse).transpose()?,
            color: args.color.clone(),
            invert: args.invert.then_some(true),
            backend: args.backend.clone(),
        })
    }

    /// Layers `over` on top of `self`; values present in `over` win.
    pub fn merge(self, over: Self) -> Self {
        Self {
            size: over.size.or(self.size),
            pix_fmt: over.pix_fmt.or(self.pix_fmt),
            x: over.x.or(self.x),
            y: over.y.or(self.y),
            width: over.width.or(self.width),
            height: over.height.or(self.height),
            thickness: over.thickness.or(self.thickness),
            color: over.color.or(self.color),
            invert: over.invert.or(self.invert),
            backend: over.backend.or(self.backend),
        }
    }

    /// Frame size; required.
    pub fn frame_size(&self) -> Result<(u32, u32)> {
        match self.size.as_deref() {
            Some(size) => parse_size(size),
            None => bail!("frame size is required (--size WxH)"),
        }
    }

    /// Pixel format, yuv420p when not given.
    pub fn pixel_format(&self) -> Result<PixelFormat> {
        match self.pix_fmt.as_deref() {
            Some(name) => name.parse().with_context(|| format!("unsupported pixel format '{name}'")),
            None => Ok(PixelFormat::Yuv420p),
        }
    }

    /// Compute backend, auto when not given.
    pub fn backend(&self) -> Result<Backend> {
        match self.backend.as_deref() {
            Some(name) => name.parse().with_context(|| format!("unknown backend '{name}'")),
            None => Ok(Backend::Auto),
        }
    }

    /// Resolves the options into a request for `width` x `height` frames.
    pub fn request(&self, shape: Shape, width: u32, height: u32) -> Result<DrawRequest> {
        let x = self.x.unwrap_or(0);
        let y = self.y.unwrap_or(0);
        let w = extent(self.width, width)?;
        let h = extent(self.height, height)?;

        let (color, invert_keyword) = match self.color.as_deref() {
            Some(c) if c.trim().eq_ignore_ascii_case("invert") => (black(), true),
            Some(c) => (
                YuvaColor::from_rgba(Rgba8::parse(c).with_context(|| format!("invalid color '{c}'"))?),
                false,
            ),
            None => (black(), false),
        };

        let request = match shape {
            Shape::Box => {
                let thickness = match self.thickness {
                    Some(Thickness::Pixels(t)) => t,
                    Some(Thickness::Fill) => w.max(h),
                    None => DEFAULT_BOX_THICKNESS,
                };
                DrawRequest::draw_box(BoxGeometry::new(x, y, w, h)).with_thickness(thickness)
            }
            Shape::Grid => {
                let thickness = match self.thickness {
                    Some(Thickness::Pixels(t)) => t,
                    Some(Thickness::Fill) => bail!("thickness 'fill' only applies to boxes"),
                    None => DEFAULT_GRID_THICKNESS,
                };
                DrawRequest::draw_grid(GridGeometry::new(x, y, w, h)).with_thickness(thickness)
            }
        };

        let request = request
            .with_color(color)
            .with_invert(invert_keyword || self.invert.unwrap_or(false));
        request.validate()?;
        Ok(request)
    }
}

fn black() -> YuvaColor {
    YuvaColor::from_rgba(Rgba8::new(0, 0, 0, 255))
}

/// Missing or zero extent means the full frame dimension.
fn extent(value: Option<i32>, full: u32) -> Result<i32> {
    match value.unwrap_or(0) {
        0 => i32::try_from(full).with_context(|| format!("frame dimension {full} too large")),
        v => Ok(v),
    }
}

/// Parses `WxH`.
pub fn parse_size(s: &str) -> Result<(u32, u32)> {
    let Some((w, h)) = s.trim().split_once(['x', 'X']) else {
        bail!("invalid size '{s}': expected WxH");
    };
    let w: u32 = w.parse().with_context(|| format!("invalid width in '{s}'"))?;
    let h: u32 = h.parse().with_context(|| format!("invalid height in '{s}'"))?;
    if w == 0 || h == 0 {
        bail!("invalid size '{s}': dimensions must be non-zero");
    }
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1920x1080").unwrap(), (1920, 1080));
        assert_eq!(parse_size("640X480").unwrap(), (640, 480));
        assert!(parse_size("1920").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("axb").is_err());
    }

    #[test]
    fn test_thickness_parse() {
        assert_eq!("fill".parse::<Thickness>().unwrap(), Thickness::Fill);
        assert_eq!("FILL".parse::<Thickness>().unwrap(), Thickness::Fill);
        assert_eq!(" 4 ".parse::<Thickness>().unwrap(), Thickness::Pixels(4));
        assert!("thick".parse::<Thickness>().is_err());
    }

    #[test]
    fn test_command_line_overrides_file() {
        let file = DrawOptions {
            x: Some(5),
            y: Some(6),
            color: Some("red".into()),
            ..Default::default()
        };
        let args = DrawArgs {
            x: Some(1),
            thickness: Some("7".into()),
            ..Default::default()
        };
        let merged = file.merge(DrawOptions::from_args(&args).unwrap());
        assert_eq!(merged.x, Some(1));
        assert_eq!(merged.y, Some(6));
        assert_eq!(merged.color.as_deref(), Some("red"));
        assert_eq!(merged.thickness, Some(Thickness::Pixels(7)));
        // --invert absent does not clear a file value
        assert_eq!(merged.invert, None);
    }

    #[test]
    fn test_box_defaults_to_full_frame() {
        let request = DrawOptions::default().request(Shape::Box, 64, 48).unwrap();
        assert_eq!(request, DrawRequest::draw_box(BoxGeometry::new(0, 0, 64, 48)));
        assert_eq!(request.thickness, DEFAULT_BOX_THICKNESS);
        assert_eq!(request.color, YuvaColor::new(16, 128, 128, 255));
        assert!(!request.invert_color);
    }

    #[test]
    fn test_grid_zero_period_is_frame_size() {
        let opts = DrawOptions {
            width: Some(0),
            height: Some(16),
            ..Default::default()
        };
        let request = opts.request(Shape::Grid, 64, 48).unwrap();
        assert_eq!(request.mode.bounds(), [0, 0, 64, 16]);
        assert_eq!(request.thickness, DEFAULT_GRID_THICKNESS);
    }

    #[test]
    fn test_fill_covers_box() {
        let opts = DrawOptions {
            width: Some(30),
            height: Some(10),
            thickness: Some(Thickness::Fill),
            ..Default::default()
        };
        let request = opts.request(Shape::Box, 64, 48).unwrap();
        assert_eq!(request.thickness, 30);
        assert!(request.mode.contains(15, 5, request.thickness));

        assert!(opts.request(Shape::Grid, 64, 48).is_err());
    }

    #[test]
    fn test_color_keywords() {
        let invert = DrawOptions {
            color: Some("Invert".into()),
            ..Default::default()
        };
        assert!(invert.request(Shape::Box, 8, 8).unwrap().invert_color);

        let translucent = DrawOptions {
            color: Some("red@0.5".into()),
            ..Default::default()
        };
        let request = translucent.request(Shape::Box, 8, 8).unwrap();
        assert_eq!(request.color, YuvaColor::from_rgba(Rgba8::new(255, 0, 0, 127)));

        let bad = DrawOptions {
            color: Some("nope".into()),
            ..Default::default()
        };
        assert!(bad.request(Shape::Box, 8, 8).is_err());
    }

    #[test]
    fn test_invalid_request_rejected() {
        let opts = DrawOptions {
            thickness: Some(Thickness::Pixels(-1)),
            ..Default::default()
        };
        assert!(opts.request(Shape::Box, 8, 8).is_err());
    }

    #[test]
    fn test_format_and_backend() {
        let opts = DrawOptions::default();
        assert_eq!(opts.pixel_format().unwrap(), PixelFormat::Yuv420p);
        assert_eq!(opts.backend().unwrap(), Backend::Auto);
        assert!(opts.frame_size().is_err());

        let opts = DrawOptions {
            pix_fmt: Some("yuva444p".into()),
            backend: Some("cpu".into()),
            ..Default::default()
        };
        assert_eq!(opts.pixel_format().unwrap(), PixelFormat::Yuva444p);
        assert_eq!(opts.backend().unwrap(), Backend::Cpu);

        let bad = DrawOptions {
            pix_fmt: Some("rgb24".into()),
            backend: Some("opencl".into()),
            ..Default::default()
        };
        assert!(bad.pixel_format().is_err());
        assert!(bad.backend().is_err());
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(
            "size: 64x48\npix-fmt: yuva420p\nx: 10\ny: -4\nthickness: fill\ncolor: blue\ninvert: false\n",
        );
        let opts = DrawOptions::load(file.path()).unwrap();
        assert_eq!(opts.frame_size().unwrap(), (64, 48));
        assert_eq!(opts.pixel_format().unwrap(), PixelFormat::Yuva420p);
        assert_eq!(opts.x, Some(10));
        assert_eq!(opts.y, Some(-4));
        assert_eq!(opts.thickness, Some(Thickness::Fill));
        assert_eq!(opts.color.as_deref(), Some("blue"));
        assert_eq!(opts.invert, Some(false));

        let file = write_config("thickness: 2\n");
        assert_eq!(DrawOptions::load(file.path()).unwrap().thickness, Some(Thickness::Pixels(2)));
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let file = write_config("x: 1\nopacity: 0.5\n");
        assert!(DrawOptions::load(file.path()).is_err());
        assert!(DrawOptions::load(Path::new("/nonexistent/draw.yaml")).is_err());
    }
}
