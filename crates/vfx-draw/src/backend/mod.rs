//! Compute backends for the draw kernels.
//!
//! Provides CPU (rayon) and wgpu backends with automatic selection.

mod cpu_backend;
mod detect;
mod gpu_primitives;

#[cfg(feature = "wgpu")]
mod wgpu_backend;

pub use cpu_backend::{CpuBuffer, CpuKernel, CpuPrimitives, CpuProgram};
pub use detect::{BackendInfo, describe_backends, detect_backends, select_best_backend};
pub use gpu_primitives::{BufferAccess, BufferHandle, GpuLimits, GpuPrimitives, KernelArgs, KernelKind};

#[cfg(feature = "wgpu")]
pub use wgpu_backend::{WgpuBuffer, WgpuKernel, WgpuPrimitives, WgpuProgram};

use std::str::FromStr;

use crate::DrawError;

/// Environment variable that overrides [`Backend::Auto`].
pub const BACKEND_ENV: &str = "VFX_DRAW_BACKEND";

/// Available compute backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Auto-select best available (wgpu > CPU).
    #[default]
    Auto,
    /// CPU backend using rayon for parallelization.
    Cpu,
    /// wgpu backend (Vulkan/Metal/DX12).
    Wgpu,
}

impl Backend {
    /// Check if this backend is available on current system.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Auto => true,
            Self::Cpu => true,
            #[cfg(feature = "wgpu")]
            Self::Wgpu => WgpuPrimitives::is_available(),
            #[cfg(not(feature = "wgpu"))]
            Self::Wgpu => false,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cpu => "cpu",
            Self::Wgpu => "wgpu",
        }
    }

    /// Backend named by `VFX_DRAW_BACKEND`, if set and valid.
    pub fn from_env() -> Option<Self> {
        let value = std::env::var(BACKEND_ENV).ok()?;
        match value.parse() {
            Ok(backend) => Some(backend),
            Err(e) => {
                tracing::warn!("ignoring {BACKEND_ENV}: {e}");
                None
            }
        }
    }

    /// Concrete backend for this choice: explicit choices stay, `Auto`
    /// honors the environment override and then probes the system.
    pub fn resolve(self) -> Self {
        match self {
            Self::Auto => match Self::from_env() {
                Some(Self::Auto) | None => select_best_backend(),
                Some(explicit) => explicit,
            },
            explicit => explicit,
        }
    }
}

impl FromStr for Backend {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "wgpu" | "gpu" => Ok(Self::Wgpu),
            other => Err(DrawError::BackendNotAvailable(format!("unknown backend '{other}'"))),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
