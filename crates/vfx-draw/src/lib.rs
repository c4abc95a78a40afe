//! GPU-accelerated box and grid overlays for planar video frames.
//!
//! Marks a rectangular border or a periodic grid on a YUV(A) frame by
//! running one of two per-pixel kernels on a compute device. Marked pixels
//! are color-replaced (frames with alpha), alpha-blended toward the overlay
//! color (frames without alpha) or luma-inverted.
//!
//! # Architecture
//!
//! ```text
//! DrawEngine<P>
//!     ├── DeviceContext<P>   runtime, compiled program, drawbox/drawgrid kernels
//!     ├── BufferManager<P>   input / output / color device buffers
//!     └── dispatch::run      16x16 work grid + KernelParams
//!             └── GpuPrimitives trait
//!                     ├── CpuPrimitives  (rayon, Rust kernels)
//!                     └── WgpuPrimitives (WGSL compute shaders)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use vfx_draw::{Backend, BoxGeometry, DrawRequest, create_engine};
//!
//! let mut engine = create_engine(Backend::Auto)?;
//! let request = DrawRequest::draw_box(BoxGeometry::new(10, 10, 200, 100))
//!     .with_thickness(4)
//!     .with_color(red);
//! let out = engine.process(&frame, &request)?;
//! ```

pub mod backend;
pub mod buffers;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod kernels;
pub mod layout;
pub mod params;
pub mod request;
mod shaders;

pub use backend::{
    Backend, BackendInfo, BufferAccess, BufferHandle, CpuPrimitives, GpuLimits, GpuPrimitives,
    KernelArgs, KernelKind, describe_backends, detect_backends, select_best_backend,
};
#[cfg(feature = "wgpu")]
pub use backend::WgpuPrimitives;
pub use buffers::BufferManager;
pub use context::DeviceContext;
pub use dispatch::{TILE_SIZE, WorkGrid};
pub use engine::{DrawEngine, FrameProcessor, create_engine};
pub use layout::PlaneLayout;
pub use params::KernelParams;
pub use request::{BoxGeometry, DrawRequest, GridGeometry, RenderMode};

use thiserror::Error;

/// Error class, used by hosts to decide what a failure means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Runtime, compile or kernel-creation failure. Fatal to the engine.
    Configuration,
    /// Buffer allocation, write or read failure. Fatal to the frame.
    Resource,
    /// Device execution failure with a device diagnostic.
    External,
    /// Bad request or frame handed in by the caller.
    Usage,
}

/// Drawing engine errors.
#[derive(Error, Debug)]
pub enum DrawError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("Failed to create device: {0}")]
    DeviceCreation(String),

    #[error("Failed to compile program: {0}")]
    ShaderCompilation(String),

    #[error("Failed to create kernel '{kernel}': {reason}")]
    KernelCreation { kernel: &'static str, reason: String },

    #[error("Engine not initialized")]
    NotInitialized,

    #[error("Failed to create buffer: {0}")]
    BufferCreation(String),

    #[error("Buffer write failed: {0}")]
    BufferWrite(String),

    #[error("Buffer read failed: {0}")]
    BufferRead(String),

    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Kernel run error occurred: {0}")]
    KernelLaunch(String),

    #[error("Invalid draw request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Frame(#[from] vfx_core::Error),
}

impl DrawError {
    /// Class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoAdapter
            | Self::BackendNotAvailable(_)
            | Self::DeviceCreation(_)
            | Self::ShaderCompilation(_)
            | Self::KernelCreation { .. }
            | Self::NotInitialized => ErrorKind::Configuration,
            Self::BufferCreation(_)
            | Self::BufferWrite(_)
            | Self::BufferRead(_)
            | Self::BufferSizeMismatch { .. } => ErrorKind::Resource,
            Self::KernelLaunch(_) => ErrorKind::External,
            Self::InvalidRequest(_) | Self::Frame(_) => ErrorKind::Usage,
        }
    }
}

pub type DrawResult<T> = Result<T, DrawError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(DrawError::NoAdapter.kind(), ErrorKind::Configuration);
        assert_eq!(
            DrawError::KernelCreation { kernel: "drawgrid", reason: "x".into() }.kind(),
            ErrorKind::Configuration
        );
        assert_eq!(DrawError::BufferWrite("x".into()).kind(), ErrorKind::Resource);
        assert_eq!(DrawError::KernelLaunch("lost".into()).kind(), ErrorKind::External);
        assert_eq!(DrawError::InvalidRequest("x".into()).kind(), ErrorKind::Usage);
    }

    #[test]
    fn test_kernel_creation_names_kernel() {
        let err = DrawError::KernelCreation { kernel: "drawbox", reason: "no entry point".into() };
        assert!(err.to_string().contains("drawbox"));
    }
}
