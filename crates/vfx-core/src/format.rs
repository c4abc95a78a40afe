//! Planar 8-bit YUV(A) pixel formats.
//!
//! Every format here stores one byte per sample in separate planes
//! (Y, U, V and optionally A). Chroma planes are reduced along each axis
//! by a power-of-two shift.
//!
//! # Usage
//!
//! ```rust
//! use vfx_core::format::PixelFormat;
//!
//! let fmt: PixelFormat = "yuv420p".parse().unwrap();
//! assert_eq!(fmt.log2_chroma_w(), 1);
//! assert_eq!(fmt.log2_chroma_h(), 1);
//! assert!(!fmt.has_alpha());
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Planar YUV layout with 8-bit samples.
///
/// Names follow the conventional `yuv<subsampling>p` spelling; the `j`
/// variants are full-range and share the layout of their limited-range
/// siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// 4:1:0, chroma quartered on both axes.
    Yuv410p,
    /// 4:1:1, chroma quartered horizontally.
    Yuv411p,
    /// 4:2:0, chroma halved on both axes.
    #[default]
    Yuv420p,
    /// 4:2:2, chroma halved horizontally.
    Yuv422p,
    /// 4:4:0, chroma halved vertically.
    Yuv440p,
    /// 4:4:4, no subsampling.
    Yuv444p,
    /// Full-range 4:2:0.
    Yuvj420p,
    /// Full-range 4:2:2.
    Yuvj422p,
    /// Full-range 4:4:4.
    Yuvj444p,
    /// 4:2:0 with a full-resolution alpha plane.
    Yuva420p,
    /// 4:2:2 with a full-resolution alpha plane.
    Yuva422p,
    /// 4:4:4 with a full-resolution alpha plane.
    Yuva444p,
}

impl PixelFormat {
    /// All supported formats.
    pub const ALL: [PixelFormat; 12] = [
        Self::Yuv410p,
        Self::Yuv411p,
        Self::Yuv420p,
        Self::Yuv422p,
        Self::Yuv440p,
        Self::Yuv444p,
        Self::Yuvj420p,
        Self::Yuvj422p,
        Self::Yuvj444p,
        Self::Yuva420p,
        Self::Yuva422p,
        Self::Yuva444p,
    ];

    /// Canonical lowercase name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Yuv410p => "yuv410p",
            Self::Yuv411p => "yuv411p",
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv440p => "yuv440p",
            Self::Yuv444p => "yuv444p",
            Self::Yuvj420p => "yuvj420p",
            Self::Yuvj422p => "yuvj422p",
            Self::Yuvj444p => "yuvj444p",
            Self::Yuva420p => "yuva420p",
            Self::Yuva422p => "yuva422p",
            Self::Yuva444p => "yuva444p",
        }
    }

    /// Looks a format up by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Horizontal chroma shift (`hsub`).
    #[inline]
    pub const fn log2_chroma_w(&self) -> u32 {
        match self {
            Self::Yuv410p | Self::Yuv411p => 2,
            Self::Yuv420p | Self::Yuv422p | Self::Yuvj420p | Self::Yuvj422p => 1,
            Self::Yuva420p | Self::Yuva422p => 1,
            Self::Yuv440p | Self::Yuv444p | Self::Yuvj444p | Self::Yuva444p => 0,
        }
    }

    /// Vertical chroma shift (`vsub`).
    #[inline]
    pub const fn log2_chroma_h(&self) -> u32 {
        match self {
            Self::Yuv410p => 2,
            Self::Yuv420p | Self::Yuvj420p | Self::Yuva420p | Self::Yuv440p => 1,
            _ => 0,
        }
    }

    /// Whether the format carries a fourth (alpha) plane.
    #[inline]
    pub const fn has_alpha(&self) -> bool {
        matches!(self, Self::Yuva420p | Self::Yuva422p | Self::Yuva444p)
    }

    /// Number of planes (3 or 4).
    #[inline]
    pub const fn plane_count(&self) -> usize {
        if self.has_alpha() { 4 } else { 3 }
    }

    /// Width of a chroma plane for a frame `width` pixels wide.
    #[inline]
    pub const fn chroma_width(&self, width: u32) -> u32 {
        ceil_rshift(width, self.log2_chroma_w())
    }

    /// Height of a chroma plane for a frame `height` rows tall.
    #[inline]
    pub const fn chroma_height(&self, height: u32) -> u32 {
        ceil_rshift(height, self.log2_chroma_h())
    }

    /// Bytes of one tightly packed frame.
    pub fn packed_frame_size(&self, width: u32, height: u32) -> usize {
        let luma = width as usize * height as usize;
        let chroma = self.chroma_width(width) as usize * self.chroma_height(height) as usize;
        let alpha = if self.has_alpha() { luma } else { 0 };
        luma + 2 * chroma + alpha
    }
}

/// Divide by `2^shift`, rounding up.
#[inline]
pub const fn ceil_rshift(value: u32, shift: u32) -> u32 {
    // -((-a) >> b) without going through signed types
    ((value as u64 + (1u64 << shift) - 1) >> shift) as u32
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| Error::unsupported_format(s))
    }
}
