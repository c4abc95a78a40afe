//! Device abstraction shared by every backend.
//!
//! A backend exposes the handful of runtime operations the engine needs:
//! program compilation, kernel creation, byte buffers, a kernel launch over
//! a 2D work grid and a blocking read back.

use crate::DrawResult;
use crate::dispatch::WorkGrid;
use crate::params::KernelParams;

/// The two kernels of the draw program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelKind {
    DrawBox,
    DrawGrid,
}

impl KernelKind {
    pub const ALL: [KernelKind; 2] = [Self::DrawBox, Self::DrawGrid];

    /// Entry point name in the compiled program.
    pub const fn entry_point(&self) -> &'static str {
        match self {
            Self::DrawBox => "drawbox",
            Self::DrawGrid => "drawgrid",
        }
    }
}

impl std::fmt::Display for KernelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.entry_point())
    }
}

/// How kernels use a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferAccess {
    ReadOnly,
    WriteOnly,
}

impl BufferAccess {
    /// Host uploads are allowed into buffers kernels only read.
    pub const fn host_writable(self) -> bool {
        matches!(self, Self::ReadOnly)
    }

    /// Host read back is allowed from buffers kernels write.
    pub const fn host_readable(self) -> bool {
        matches!(self, Self::WriteOnly)
    }
}

/// Handle to device memory.
pub trait BufferHandle: Send + Sync {
    /// Allocated size in bytes.
    fn size_bytes(&self) -> u64;
}

/// Device limits that bound buffer allocation and dispatch size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuLimits {
    /// Largest single buffer.
    pub max_buffer_bytes: u64,
    /// Largest workgroup count along one dispatch axis.
    pub max_workgroups_per_dim: u32,
    /// Memory available to the device, in bytes.
    pub available_memory: u64,
}

impl Default for GpuLimits {
    fn default() -> Self {
        Self {
            max_buffer_bytes: 256 * 1024 * 1024,
            max_workgroups_per_dim: 65535,
            available_memory: 2 * 1024 * 1024 * 1024,
        }
    }
}

/// Arguments of one kernel launch, in kernel parameter order.
pub struct KernelArgs<'a, B> {
    /// Packed input planes.
    pub src: &'a B,
    /// Packed output planes, same layout as `src`.
    pub dst: &'a mut B,
    /// 4 bytes: Y, U, V, A.
    pub color: &'a B,
    /// Scalar parameters.
    pub params: KernelParams,
}

/// Core device operations.
pub trait GpuPrimitives: Send + Sync {
    /// Backend-specific buffer type.
    type Buffer: BufferHandle;
    /// Compiled program holding both kernels.
    type Program: Send + Sync;
    /// Launchable kernel.
    type Kernel: Send + Sync;

    /// Compile a program from source.
    fn compile_program(&self, source: &str) -> DrawResult<Self::Program>;

    /// Create the kernel `kind` from a compiled program.
    fn create_kernel(&self, program: &Self::Program, kind: KernelKind) -> DrawResult<Self::Kernel>;

    /// Allocate a zeroed buffer of `size` bytes.
    fn create_buffer(&self, size: u64, access: BufferAccess, label: &str) -> DrawResult<Self::Buffer>;

    /// Copy host bytes into a buffer at `offset`.
    fn write_buffer(&self, buffer: &mut Self::Buffer, offset: u64, data: &[u8]) -> DrawResult<()>;

    /// Launch `kernel` over `grid`. Clears `args.dst` first.
    ///
    /// May return before the kernel finishes; [`read_buffer`](Self::read_buffer)
    /// is the synchronization point.
    fn enqueue(&self, kernel: &Self::Kernel, args: KernelArgs<'_, Self::Buffer>, grid: &WorkGrid) -> DrawResult<()>;

    /// Block until all queued work finished, then copy the first
    /// `out.len()` bytes of `buffer` to the host.
    fn read_buffer(&self, buffer: &Self::Buffer, out: &mut [u8]) -> DrawResult<()>;

    /// Device limits.
    fn limits(&self) -> &GpuLimits;

    /// Backend name.
    fn name(&self) -> &'static str;
}
