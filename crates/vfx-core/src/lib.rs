//! # vfx-core
//!
//! Core types for planar video processing.
//!
//! This crate provides the foundational types used by the drawing engine
//! and the command line tool:
//!
//! - [`PixelFormat`] - Planar 8-bit YUV(A) layouts and their chroma subsampling
//! - [`Frame`], [`Plane`] - Owned planar frames with per-plane row strides
//! - [`Rgba8`], [`YuvaColor`] - Color parsing and BT.601 conversion
//!
//! ## Crate Structure
//!
//! ```text
//! vfx-core (this crate)
//!    ^
//!    |
//!    +-- vfx-draw (device-side box/grid rendering)
//!    +-- vfx-cli  (raw video host wrapper)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod color;
pub mod error;
pub mod format;
pub mod frame;

// Re-exports for convenience
pub use color::{Rgba8, YuvaColor};
pub use error::*;
pub use format::{ceil_rshift, PixelFormat};
pub use frame::{Frame, Plane, PLANE_A, PLANE_U, PLANE_V, PLANE_Y};
