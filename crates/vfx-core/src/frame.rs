//! Planar video frames.
//!
//! A [`Frame`] owns one [`Plane`] per channel. Each plane keeps its own row
//! stride, which may be wider than the visible plane width (padded rows as
//! produced by decoders). Helpers convert to and from the tightly packed
//! layout used for raw video files and device buffers.

use std::io::{self, Read, Write};

use crate::error::{Error, Result};
use crate::format::PixelFormat;

/// Plane index of luma.
pub const PLANE_Y: usize = 0;
/// Plane index of blue-difference chroma.
pub const PLANE_U: usize = 1;
/// Plane index of red-difference chroma.
pub const PLANE_V: usize = 2;
/// Plane index of alpha (only for `yuva*` formats).
pub const PLANE_A: usize = 3;

/// One single-channel 2D sample array.
#[derive(Clone, PartialEq, Eq)]
pub struct Plane {
    data: Vec<u8>,
    stride: usize,
    width: u32,
    height: u32,
}

impl Plane {
    /// Zero-filled plane with the given row stride.
    pub fn new(width: u32, height: u32, stride: usize) -> Self {
        Self {
            data: vec![0; stride * height as usize],
            stride,
            width,
            height,
        }
    }

    /// Wraps existing sample data.
    pub fn from_data(data: Vec<u8>, width: u32, height: u32, stride: usize) -> Self {
        Self { data, stride, width, height }
    }

    /// Visible width in samples.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes between the starts of two consecutive rows.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Raw data including row padding.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable raw data including row padding.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Visible samples of row `y`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize]
    }

    /// Mutable visible samples of row `y`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        &mut self.data[start..start + self.width as usize]
    }

    /// Sample at `(x, y)`.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.stride + x as usize]
    }

    /// Writes the sample at `(x, y)`.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        self.data[y as usize * self.stride + x as usize] = value;
    }

    /// Sets every visible sample to `value`.
    pub fn fill(&mut self, value: u8) {
        for y in 0..self.height {
            self.row_mut(y).fill(value);
        }
    }

    fn validate(&self, index: usize) -> Result<()> {
        if self.stride < self.width as usize {
            return Err(Error::InvalidStride {
                plane: index,
                stride: self.stride,
                min_stride: self.width as usize,
            });
        }
        let expected = if self.height == 0 {
            0
        } else {
            self.stride * (self.height as usize - 1) + self.width as usize
        };
        if self.data.len() < expected {
            return Err(Error::PlaneTooSmall {
                plane: index,
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plane")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .finish()
    }
}

/// A planar YUV(A) frame with 8-bit samples.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    format: PixelFormat,
    width: u32,
    height: u32,
    planes: Vec<Plane>,
}

impl Frame {
    /// Zero-filled frame with tight strides.
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Result<Self> {
        let cw = format.chroma_width(width) as usize;
        let mut strides = vec![width as usize, cw, cw];
        if format.has_alpha() {
            strides.push(width as usize);
        }
        Self::with_strides(format, width, height, &strides)
    }

    /// Zero-filled frame with caller-chosen row strides (one per plane).
    pub fn with_strides(format: PixelFormat, width: u32, height: u32, strides: &[usize]) -> Result<Self> {
        check_dimensions(width, height)?;
        if strides.len() != format.plane_count() {
            return Err(Error::unsupported_format(format!(
                "{format} needs {} strides, got {}",
                format.plane_count(),
                strides.len()
            )));
        }
        let planes = strides
            .iter()
            .enumerate()
            .map(|(i, &stride)| {
                let (w, h) = plane_dims(format, width, height, i);
                Plane::new(w, h, stride)
            })
            .collect();
        Self::from_planes(format, width, height, planes)
    }

    /// Assembles a frame from existing planes, checking their geometry.
    pub fn from_planes(format: PixelFormat, width: u32, height: u32, planes: Vec<Plane>) -> Result<Self> {
        check_dimensions(width, height)?;
        if planes.len() != format.plane_count() {
            return Err(Error::unsupported_format(format!(
                "{format} has {} planes, got {}",
                format.plane_count(),
                planes.len()
            )));
        }
        for (i, plane) in planes.iter().enumerate() {
            let (w, h) = plane_dims(format, width, height, i);
            if plane.width != w || plane.height != h {
                return Err(Error::dimension_mismatch((w, h), (plane.width, plane.height)));
            }
            plane.validate(i)?;
        }
        Ok(Self { format, width, height, planes })
    }

    /// Frame with every plane filled with a constant (`alpha` is ignored
    /// without an alpha plane).
    pub fn filled(format: PixelFormat, width: u32, height: u32, yuva: [u8; 4]) -> Result<Self> {
        let mut frame = Self::new(format, width, height)?;
        for (i, plane) in frame.planes.iter_mut().enumerate() {
            plane.fill(yuva[i]);
        }
        Ok(frame)
    }

    /// Builds a frame from tightly packed bytes (Y, U, V[, A] back to back).
    pub fn from_packed(format: PixelFormat, width: u32, height: u32, data: &[u8]) -> Result<Self> {
        check_dimensions(width, height)?;
        let expected = format.packed_frame_size(width, height);
        if data.len() != expected {
            return Err(Error::PlaneTooSmall {
                plane: 0,
                expected,
                actual: data.len(),
            });
        }
        let mut rest = data;
        let planes = (0..format.plane_count())
            .map(|i| {
                let (w, h) = plane_dims(format, width, height, i);
                let (samples, tail) = rest.split_at(w as usize * h as usize);
                rest = tail;
                Plane::from_data(samples.to_vec(), w, h, w as usize)
            })
            .collect();
        Self::from_planes(format, width, height, planes)
    }

    /// Tightly packed copy of all planes.
    pub fn to_packed(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.format.packed_frame_size(self.width, self.height));
        for plane in &self.planes {
            for y in 0..plane.height {
                out.extend_from_slice(plane.row(y));
            }
        }
        out
    }

    /// Reads one packed frame. Returns `Ok(None)` on a clean end of stream.
    pub fn read_from<R: Read>(reader: &mut R, format: PixelFormat, width: u32, height: u32) -> Result<Option<Self>> {
        let size = format.packed_frame_size(width, height);
        let mut buf = vec![0u8; size];
        let mut filled = 0;
        while filled < size {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        match filled {
            0 => Ok(None),
            n if n < size => Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("truncated frame: {n} of {size} bytes"),
            ))),
            _ => Self::from_packed(format, width, height, &buf).map(Some),
        }
    }

    /// Writes the frame in packed layout.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for plane in &self.planes {
            for y in 0..plane.height {
                writer.write_all(plane.row(y))?;
            }
        }
        Ok(())
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Chroma plane dimensions `(cw, ch)`.
    #[inline]
    pub fn chroma_dims(&self) -> (u32, u32) {
        (
            self.format.chroma_width(self.width),
            self.format.chroma_height(self.height),
        )
    }

    /// All planes in Y, U, V[, A] order.
    #[inline]
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Plane by index.
    #[inline]
    pub fn plane(&self, index: usize) -> &Plane {
        &self.planes[index]
    }

    /// Mutable plane by index.
    #[inline]
    pub fn plane_mut(&mut self, index: usize) -> &mut Plane {
        &mut self.planes[index]
    }

    /// Whether `other` has the same format and size.
    pub fn same_geometry(&self, other: &Frame) -> bool {
        self.format == other.format && self.width == other.width && self.height == other.height
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("planes", &self.planes)
            .finish()
    }
}

fn plane_dims(format: PixelFormat, width: u32, height: u32, index: usize) -> (u32, u32) {
    match index {
        PLANE_U | PLANE_V => (format.chroma_width(width), format.chroma_height(height)),
        _ => (width, height),
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_dimensions(width, height, "zero size"));
    }
    if width > i32::MAX as u32 / 2 || height > i32::MAX as u32 / 2 {
        return Err(Error::invalid_dimensions(width, height, "too large"));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| Error::invalid_dimensions(width, height, "size overflow"))?;
    Ok(())
}
