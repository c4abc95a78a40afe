//! CPU backend using rayon for parallelization.
//!
//! Runs the Rust pixel kernels from [`crate::kernels`] over host byte
//! buffers with the same packed layout the device kernels use. Output rows
//! are split across threads; each chroma sample is computed from the pixel
//! that owns it, so results match the scalar reference exactly.

use rayon::prelude::*;

use super::gpu_primitives::{BufferAccess, BufferHandle, GpuLimits, GpuPrimitives, KernelArgs, KernelKind};
use crate::dispatch::WorkGrid;
use crate::kernels::{self, Pixel};
use crate::params::KernelParams;
use crate::{DrawError, DrawResult};

/// CPU buffer - data stored in RAM.
pub struct CpuBuffer {
    data: Vec<u8>,
    access: BufferAccess,
}

impl BufferHandle for CpuBuffer {
    fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}

/// "Compiled" program: the kernels its source declares.
pub struct CpuProgram {
    kernels: Vec<KernelKind>,
}

/// Kernel handle.
pub struct CpuKernel {
    kind: KernelKind,
}

/// CPU primitives implementation.
pub struct CpuPrimitives {
    limits: GpuLimits,
}

impl CpuPrimitives {
    pub fn new() -> Self {
        // Get system RAM (fallback to 4GB if detection fails)
        let available = sys_info::mem_info()
            .map(|m| m.avail * 1024)
            .unwrap_or(4 * 1024 * 1024 * 1024);

        Self::with_limits(GpuLimits {
            max_buffer_bytes: available.min(isize::MAX as u64),
            max_workgroups_per_dim: u32::MAX,
            available_memory: available,
        })
    }

    /// CPU backend reporting custom limits.
    pub fn with_limits(limits: GpuLimits) -> Self {
        Self { limits }
    }
}

impl Default for CpuPrimitives {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuPrimitives for CpuPrimitives {
    type Buffer = CpuBuffer;
    type Program = CpuProgram;
    type Kernel = CpuKernel;

    fn compile_program(&self, source: &str) -> DrawResult<Self::Program> {
        let kernels: Vec<KernelKind> = KernelKind::ALL
            .into_iter()
            .filter(|k| source.contains(&format!("fn {}(", k.entry_point())))
            .collect();
        if kernels.is_empty() {
            return Err(DrawError::ShaderCompilation("program declares no draw kernels".into()));
        }
        Ok(CpuProgram { kernels })
    }

    fn create_kernel(&self, program: &Self::Program, kind: KernelKind) -> DrawResult<Self::Kernel> {
        if !program.kernels.contains(&kind) {
            return Err(DrawError::KernelCreation {
                kernel: kind.entry_point(),
                reason: "entry point not found in program".into(),
            });
        }
        Ok(CpuKernel { kind })
    }

    fn create_buffer(&self, size: u64, access: BufferAccess, label: &str) -> DrawResult<Self::Buffer> {
        let len = usize::try_from(size)
            .map_err(|_| DrawError::BufferCreation(format!("{label}: {size} bytes")))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| DrawError::BufferCreation(format!("{label}: {e}")))?;
        data.resize(len, 0);
        Ok(CpuBuffer { data, access })
    }

    fn write_buffer(&self, buffer: &mut Self::Buffer, offset: u64, data: &[u8]) -> DrawResult<()> {
        if !buffer.access.host_writable() {
            return Err(DrawError::BufferWrite("buffer is kernel write-only".into()));
        }
        let start = offset as usize;
        let end = start
            .checked_add(data.len())
            .filter(|&end| end <= buffer.data.len())
            .ok_or_else(|| {
                DrawError::BufferWrite(format!(
                    "{} bytes at {offset} overflow {} byte buffer",
                    data.len(),
                    buffer.data.len()
                ))
            })?;
        buffer.data[start..end].copy_from_slice(data);
        Ok(())
    }

    fn enqueue(&self, kernel: &Self::Kernel, args: KernelArgs<'_, Self::Buffer>, grid: &WorkGrid) -> DrawResult<()> {
        let KernelArgs { src, dst, color, params: p } = args;
        let frame = PackedFrame::new(&p);

        if grid.global[0] < grid.active[0] || grid.global[1] < grid.active[1] {
            return Err(DrawError::KernelLaunch(format!(
                "work grid {:?} smaller than frame {:?}",
                grid.global, grid.active
            )));
        }
        if grid.active != [p.width as u32, p.height as u32] {
            return Err(DrawError::KernelLaunch("work grid does not match frame size".into()));
        }
        if src.data.len() < frame.total || dst.data.len() < frame.total {
            return Err(DrawError::KernelLaunch(format!(
                "buffers too small: need {} bytes, have {} / {}",
                frame.total,
                src.data.len(),
                dst.data.len()
            )));
        }
        let color: [u8; 4] = color
            .data
            .get(..4)
            .and_then(|c| c.try_into().ok())
            .ok_or_else(|| DrawError::KernelLaunch("color buffer shorter than 4 bytes".into()))?;

        dst.data.fill(0);
        let src = src.data.as_slice();
        let out = |x: i32, y: i32| -> Pixel {
            let marked = kernels::contains(kernel.kind, &p, x, y);
            kernels::shade(&p, color, marked, frame.pixel(src, x, y))
        };

        let (luma, rest) = dst.data.split_at_mut(frame.u_offset);
        let (u_plane, rest) = rest.split_at_mut(frame.chroma);
        let (v_plane, rest) = rest.split_at_mut(frame.chroma);

        let w = p.width as usize;
        luma.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
            for (x, sample) in row.iter_mut().enumerate() {
                *sample = out(x as i32, y as i32).y;
            }
        });

        let cw = p.cw as usize;
        u_plane
            .par_chunks_mut(cw)
            .zip(v_plane.par_chunks_mut(cw))
            .enumerate()
            .for_each(|(cy, (u_row, v_row))| {
                for cx in 0..cw {
                    let (x, y) = frame.chroma_owner(cx as i32, cy as i32);
                    let px = out(x, y);
                    u_row[cx] = px.u;
                    v_row[cx] = px.v;
                }
            });

        if p.has_alpha() {
            rest[..frame.luma].par_chunks_mut(w).enumerate().for_each(|(y, row)| {
                for (x, sample) in row.iter_mut().enumerate() {
                    *sample = out(x as i32, y as i32).a;
                }
            });
        }
        Ok(())
    }

    fn read_buffer(&self, buffer: &Self::Buffer, out: &mut [u8]) -> DrawResult<()> {
        if !buffer.access.host_readable() {
            return Err(DrawError::BufferRead("buffer is kernel read-only".into()));
        }
        let src = buffer.data.get(..out.len()).ok_or_else(|| {
            DrawError::BufferRead(format!(
                "requested {} bytes from {} byte buffer",
                out.len(),
                buffer.data.len()
            ))
        })?;
        out.copy_from_slice(src);
        Ok(())
    }

    fn limits(&self) -> &GpuLimits {
        &self.limits
    }

    fn name(&self) -> &'static str {
        "CPU"
    }
}

/// Plane offsets of a packed frame described by kernel parameters.
struct PackedFrame {
    p: KernelParams,
    luma: usize,
    chroma: usize,
    u_offset: usize,
    v_offset: usize,
    a_offset: usize,
    total: usize,
}

impl PackedFrame {
    fn new(p: &KernelParams) -> Self {
        let luma = p.width as usize * p.height as usize;
        let chroma = p.cw as usize * p.ch as usize;
        let u_offset = luma;
        let v_offset = u_offset + chroma;
        let a_offset = v_offset + chroma;
        let total = a_offset + if p.has_alpha() { luma } else { 0 };
        Self { p: *p, luma, chroma, u_offset, v_offset, a_offset, total }
    }

    /// Source samples of pixel `(x, y)`.
    #[inline]
    fn pixel(&self, src: &[u8], x: i32, y: i32) -> Pixel {
        let p = &self.p;
        let pos = x as usize + y as usize * p.width as usize;
        let cpos = (x >> p.hsub) as usize + (y >> p.vsub) as usize * p.cw as usize;
        Pixel {
            y: src[pos],
            u: src[self.u_offset + cpos],
            v: src[self.v_offset + cpos],
            a: if p.has_alpha() { src[self.a_offset + pos] } else { 0 },
        }
    }

    /// Pixel that writes chroma sample `(cx, cy)`.
    #[inline]
    fn chroma_owner(&self, cx: i32, cy: i32) -> (i32, i32) {
        let p = &self.p;
        let x = (((cx + 1) << p.hsub).min(p.width)) - 1;
        let y = (((cy + 1) << p.vsub).min(p.height)) - 1;
        debug_assert!(kernels::chroma_owner(p, x, y));
        (x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders;

    #[test]
    fn test_compile_finds_both_kernels() {
        let cpu = CpuPrimitives::new();
        let program = cpu.compile_program(shaders::DRAW_KERNELS).unwrap();
        assert!(cpu.create_kernel(&program, KernelKind::DrawBox).is_ok());
        assert!(cpu.create_kernel(&program, KernelKind::DrawGrid).is_ok());
    }

    #[test]
    fn test_missing_entry_point() {
        let cpu = CpuPrimitives::new();
        let program = cpu.compile_program("fn drawbox(id: vec3<u32>) {}").unwrap();
        let err = cpu.create_kernel(&program, KernelKind::DrawGrid).err().unwrap();
        assert!(matches!(err, DrawError::KernelCreation { kernel: "drawgrid", .. }));
        assert!(cpu.compile_program("").is_err());
    }

    #[test]
    fn test_buffer_bounds() {
        let cpu = CpuPrimitives::new();
        let mut buf = cpu.create_buffer(8, BufferAccess::ReadOnly, "test").unwrap();
        assert_eq!(buf.size_bytes(), 8);
        cpu.write_buffer(&mut buf, 4, &[1, 2, 3, 4]).unwrap();
        assert!(cpu.write_buffer(&mut buf, 6, &[1, 2, 3]).is_err());

        let out = cpu.create_buffer(8, BufferAccess::WriteOnly, "out").unwrap();
        let mut host = [7u8; 8];
        cpu.read_buffer(&out, &mut host).unwrap();
        assert_eq!(host, [0; 8]);
        let mut big = [0u8; 9];
        assert!(cpu.read_buffer(&out, &mut big).is_err());
    }

    #[test]
    fn test_access_direction_enforced() {
        let cpu = CpuPrimitives::new();
        let input = cpu.create_buffer(4, BufferAccess::ReadOnly, "input").unwrap();
        let mut output = cpu.create_buffer(4, BufferAccess::WriteOnly, "output").unwrap();

        let mut host = [0u8; 4];
        let err = cpu.read_buffer(&input, &mut host).unwrap_err();
        assert!(matches!(err, DrawError::BufferRead(_)));
        let err = cpu.write_buffer(&mut output, 0, &[1, 2, 3, 4]).unwrap_err();
        assert!(matches!(err, DrawError::BufferWrite(_)));
    }

    #[test]
    fn test_launch_output_readable() {
        let cpu = CpuPrimitives::new();
        let program = cpu.compile_program(shaders::DRAW_KERNELS).unwrap();
        let kernel = cpu.create_kernel(&program, KernelKind::DrawBox).unwrap();
        // 2x2 yuv444p inside a box border thick enough to cover it
        let params = KernelParams { width: 2, height: 2, cw: 2, ch: 2, rx: -1, ry: -1, rw: 4, rh: 4, thickness: 4, ..Default::default() };
        let mut src = cpu.create_buffer(12, BufferAccess::ReadOnly, "src").unwrap();
        cpu.write_buffer(&mut src, 0, &[9; 12]).unwrap();
        let mut color = cpu.create_buffer(4, BufferAccess::ReadOnly, "color").unwrap();
        cpu.write_buffer(&mut color, 0, &[200, 100, 50, 255]).unwrap();
        let mut dst = cpu.create_buffer(12, BufferAccess::WriteOnly, "dst").unwrap();

        let args = KernelArgs { src: &src, dst: &mut dst, color: &color, params };
        cpu.enqueue(&kernel, args, &WorkGrid::new(2, 2)).unwrap();
        let mut host = [0u8; 12];
        cpu.read_buffer(&dst, &mut host).unwrap();
        assert_eq!(host, [200, 200, 200, 200, 100, 100, 100, 100, 50, 50, 50, 50]);
    }

    #[test]
    fn test_launch_rejects_short_buffers() {
        let cpu = CpuPrimitives::new();
        let program = cpu.compile_program(shaders::DRAW_KERNELS).unwrap();
        let kernel = cpu.create_kernel(&program, KernelKind::DrawBox).unwrap();
        let src = cpu.create_buffer(4, BufferAccess::ReadOnly, "src").unwrap();
        let mut dst = cpu.create_buffer(4, BufferAccess::WriteOnly, "dst").unwrap();
        let color = cpu.create_buffer(4, BufferAccess::ReadOnly, "color").unwrap();
        let params = KernelParams { width: 4, height: 4, cw: 2, ch: 2, hsub: 1, vsub: 1, rw: 1, rh: 1, ..Default::default() };
        let args = KernelArgs { src: &src, dst: &mut dst, color: &color, params };
        let err = cpu.enqueue(&kernel, args, &WorkGrid::new(4, 4)).unwrap_err();
        assert!(matches!(err, DrawError::KernelLaunch(_)));
    }
}
