//! Error types for vfx-core operations.
//!
//! This module provides the error type shared by the frame model, the
//! color parser and the raw frame readers/writers.
//!
//! # Overview
//!
//! The [`Error`] enum covers all failure modes that can occur during:
//! - Frame construction (dimensions, strides, plane sizes)
//! - Pixel format lookup
//! - Color string parsing
//! - Raw frame I/O
//!
//! # Usage
//!
//! ```rust
//! use vfx_core::{Error, Result};
//!
//! fn check(width: u32, height: u32) -> Result<()> {
//!     if width == 0 || height == 0 {
//!         return Err(Error::invalid_dimensions(width, height, "zero size"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Used By
//!
//! - [`crate::frame::Frame`] - Plane bookkeeping
//! - [`crate::color`] - Color parsing
//! - `vfx-draw` - Wrapped into `DrawError::Frame`

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or moving planar frames.
///
/// # Categories
///
/// - **Format errors**: [`UnsupportedFormat`](Error::UnsupportedFormat)
/// - **Dimension errors**: [`DimensionMismatch`](Error::DimensionMismatch), [`InvalidDimensions`](Error::InvalidDimensions)
/// - **Plane errors**: [`InvalidStride`](Error::InvalidStride), [`PlaneTooSmall`](Error::PlaneTooSmall)
/// - **Color errors**: [`InvalidColor`](Error::InvalidColor)
/// - **I/O errors**: [`Io`](Error::Io)
#[derive(Debug, Error)]
pub enum Error {
    /// Pixel format is unknown or not a planar 8-bit YUV(A) layout.
    #[error("unsupported pixel format: {format}")]
    UnsupportedFormat {
        /// Format name or description
        format: String,
    },

    /// Frame dimensions don't match for the operation.
    ///
    /// Returned when a destination frame has a different geometry than
    /// its source.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First frame width
        a_width: u32,
        /// First frame height
        a_height: u32,
        /// Second frame width
        b_width: u32,
        /// Second frame height
        b_height: u32,
    },

    /// Invalid frame dimensions.
    ///
    /// Returned when width or height is zero, or dimensions would cause
    /// integer overflow in buffer size calculations.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Row stride is smaller than the plane width.
    #[error("plane {plane}: stride {stride} is less than minimum {min_stride}")]
    InvalidStride {
        /// Plane index (0 = Y, 1 = U, 2 = V, 3 = A)
        plane: usize,
        /// Provided stride
        stride: usize,
        /// Minimum required stride
        min_stride: usize,
    },

    /// Plane data is shorter than `stride * rows`.
    #[error("plane {plane}: {actual} bytes, need {expected}")]
    PlaneTooSmall {
        /// Plane index
        plane: usize,
        /// Bytes required
        expected: usize,
        /// Bytes provided
        actual: usize,
    },

    /// Color string could not be parsed.
    #[error("invalid color '{input}': {reason}")]
    InvalidColor {
        /// The rejected input
        input: String,
        /// What was wrong with it
        reason: String,
    },

    /// I/O error during raw frame reading/writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (u32, u32), b: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Creates an [`Error::UnsupportedFormat`] error.
    #[inline]
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates an [`Error::InvalidColor`] error.
    #[inline]
    pub fn invalid_color(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidColor {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is an I/O error.
    #[inline]
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.is_io_error());
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = Error::dimension_mismatch((100, 100), (200, 200));
        let msg = err.to_string();
        assert!(msg.contains("100x100"));
        assert!(msg.contains("200x200"));
    }

    #[test]
    fn test_invalid_color_message() {
        let err = Error::invalid_color("#12", "expected 6 or 8 hex digits");
        assert!(err.to_string().contains("#12"));
    }
}
