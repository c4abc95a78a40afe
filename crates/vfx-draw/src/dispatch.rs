//! Kernel dispatch: work grid, parameter marshalling, launch.

use tracing::{error, trace};

use crate::backend::{GpuPrimitives, KernelKind};
use crate::buffers::BufferManager;
use crate::layout::PlaneLayout;
use crate::params::KernelParams;
use crate::request::DrawRequest;
use crate::{DrawError, DrawResult};

/// Edge of the square work tile (local work size).
pub const TILE_SIZE: u32 = 16;

/// 2D launch geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkGrid {
    /// Global size: frame size rounded up to a multiple of [`TILE_SIZE`].
    pub global: [u32; 2],
    /// Local size: always `TILE_SIZE x TILE_SIZE`.
    pub local: [u32; 2],
    /// Frame size; invocations at or past it do nothing.
    pub active: [u32; 2],
}

impl WorkGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            global: [round_to_tile(width), round_to_tile(height)],
            local: [TILE_SIZE, TILE_SIZE],
            active: [width, height],
        }
    }

    pub fn for_frame(layout: &PlaneLayout) -> Self {
        Self::new(layout.width, layout.height)
    }

    /// Workgroup count per axis.
    #[inline]
    pub fn workgroups(&self) -> [u32; 2] {
        [self.global[0] / self.local[0], self.global[1] / self.local[1]]
    }
}

#[inline]
fn round_to_tile(v: u32) -> u32 {
    v.div_ceil(TILE_SIZE) * TILE_SIZE
}

/// Runs `kernel` for `request` over buffers already holding the frame.
///
/// Returns once the launch is queued; the result is ready after
/// [`BufferManager::download`].
pub fn run<P: GpuPrimitives>(
    device: &P,
    kind: KernelKind,
    kernel: &P::Kernel,
    buffers: &mut BufferManager<P>,
    request: &DrawRequest,
) -> DrawResult<()> {
    let layout = buffers.layout().ok_or(DrawError::NotInitialized)?;
    let grid = WorkGrid::for_frame(&layout);

    let [gx, gy] = grid.workgroups();
    let max = device.limits().max_workgroups_per_dim;
    if gx > max || gy > max {
        return Err(DrawError::KernelLaunch(format!(
            "{gx}x{gy} workgroups exceed device limit {max}"
        )));
    }

    let params = KernelParams::new(request, &layout);
    trace!(kernel = %kind, global = ?grid.global, "enqueue");

    let args = buffers.kernel_args(params)?;
    device.enqueue(kernel, args, &grid).map_err(|e| {
        let reason = match e {
            DrawError::KernelLaunch(reason) => reason,
            other => other.to_string(),
        };
        error!("Kernel run error occurred: {reason}");
        DrawError::KernelLaunch(reason)
    })
}
