//! wgpu backend implementation.
//!
//! Runs the WGSL draw kernels as compute pipelines. Device work that can
//! fail validation runs inside an error scope so failures come back as
//! [`DrawError`]s instead of panicking in the uncaptured-error handler.

use std::sync::Arc;

use wgpu::util::DeviceExt;

use super::gpu_primitives::{BufferAccess, BufferHandle, GpuLimits, GpuPrimitives, KernelArgs, KernelKind};
use crate::dispatch::WorkGrid;
use crate::{DrawError, DrawResult};

// =============================================================================
// Handles
// =============================================================================

/// Device buffer.
pub struct WgpuBuffer {
    buffer: wgpu::Buffer,
    size: u64,
    access: BufferAccess,
}

impl BufferHandle for WgpuBuffer {
    fn size_bytes(&self) -> u64 {
        self.size
    }
}

/// Compiled WGSL module.
pub struct WgpuProgram {
    module: wgpu::ShaderModule,
}

/// Compute pipeline for one entry point.
pub struct WgpuKernel {
    kind: KernelKind,
    pipeline: wgpu::ComputePipeline,
}

// =============================================================================
// WgpuPrimitives
// =============================================================================

/// wgpu GPU primitives implementation.
pub struct WgpuPrimitives {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    limits: GpuLimits,
    adapter_name: String,
}

impl WgpuPrimitives {
    /// Check if wgpu is available.
    pub fn is_available() -> bool {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Create new wgpu primitives.
    pub fn new() -> DrawResult<Self> {
        pollster::block_on(Self::new_async())
    }

    /// Create new wgpu primitives asynchronously.
    pub async fn new_async() -> DrawResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(DrawError::NoAdapter)?;

        let adapter_limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("vfx_draw_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter_limits.clone(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| DrawError::DeviceCreation(e.to_string()))?;

        let info = adapter.get_info();
        // Storage bindings cap what a kernel can address.
        let max_buffer_bytes = adapter_limits
            .max_buffer_size
            .min(adapter_limits.max_storage_buffer_binding_size as u64);
        let limits = GpuLimits {
            max_buffer_bytes,
            max_workgroups_per_dim: adapter_limits.max_compute_workgroups_per_dimension,
            available_memory: estimate_vram(&info, max_buffer_bytes),
        };
        tracing::debug!(adapter = %info.name, backend = ?info.backend, ?limits, "wgpu device ready");

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            limits,
            adapter_name: info.name,
        })
    }

    /// Adapter name as reported by the driver.
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Runs `work` inside validation and out-of-memory error scopes.
    fn scoped<T>(&self, work: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let value = work();
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        let validation = pollster::block_on(self.device.pop_error_scope());
        (value, validation.or(out_of_memory))
    }
}

impl GpuPrimitives for WgpuPrimitives {
    type Buffer = WgpuBuffer;
    type Program = WgpuProgram;
    type Kernel = WgpuKernel;

    fn compile_program(&self, source: &str) -> DrawResult<Self::Program> {
        let (module, err) = self.scoped(|| {
            self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("draw_kernels"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        });
        match err {
            Some(e) => Err(DrawError::ShaderCompilation(e.to_string())),
            None => Ok(WgpuProgram { module }),
        }
    }

    fn create_kernel(&self, program: &Self::Program, kind: KernelKind) -> DrawResult<Self::Kernel> {
        let (pipeline, err) = self.scoped(|| {
            self.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(kind.entry_point()),
                layout: None, // Auto layout
                module: &program.module,
                entry_point: Some(kind.entry_point()),
                compilation_options: Default::default(),
                cache: None,
            })
        });
        match err {
            Some(e) => Err(DrawError::KernelCreation {
                kernel: kind.entry_point(),
                reason: e.to_string(),
            }),
            None => Ok(WgpuKernel { kind, pipeline }),
        }
    }

    fn create_buffer(&self, size: u64, access: BufferAccess, label: &str) -> DrawResult<Self::Buffer> {
        if size % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(DrawError::BufferCreation(format!("{label}: size {size} is not 4-byte aligned")));
        }
        let (buffer, err) = self.scoped(|| {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: buffer_usage(access),
                mapped_at_creation: false,
            })
        });
        match err {
            Some(e) => Err(DrawError::BufferCreation(format!("{label}: {e}"))),
            None => Ok(WgpuBuffer { buffer, size, access }),
        }
    }

    fn write_buffer(&self, buffer: &mut Self::Buffer, offset: u64, data: &[u8]) -> DrawResult<()> {
        if !buffer.access.host_writable() {
            return Err(DrawError::BufferWrite("buffer is kernel write-only".into()));
        }
        let end = offset + data.len() as u64;
        if end > buffer.size {
            return Err(DrawError::BufferWrite(format!(
                "{} bytes at {offset} overflow {} byte buffer",
                data.len(),
                buffer.size
            )));
        }
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 || data.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(DrawError::BufferWrite(format!(
                "unaligned write of {} bytes at {offset}",
                data.len()
            )));
        }
        let ((), err) = self.scoped(|| self.queue.write_buffer(&buffer.buffer, offset, data));
        match err {
            Some(e) => Err(DrawError::BufferWrite(e.to_string())),
            None => Ok(()),
        }
    }

    fn enqueue(&self, kernel: &Self::Kernel, args: KernelArgs<'_, Self::Buffer>, grid: &WorkGrid) -> DrawResult<()> {
        let [gx, gy] = grid.workgroups();

        let ((), err) = self.scoped(|| {
            let params_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("draw_params"),
                contents: args.params.as_bytes(),
                usage: wgpu::BufferUsages::UNIFORM,
            });

            let layout = kernel.pipeline.get_bind_group_layout(0);
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("draw_bind_group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: args.src.buffer.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: args.dst.buffer.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 2, resource: args.color.buffer.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 3, resource: params_buf.as_entire_binding() },
                ],
            });

            let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(kernel.kind.entry_point()),
            });
            // Kernels OR bytes into place.
            encoder.clear_buffer(&args.dst.buffer, 0, None);
            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some("draw_pass"),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&kernel.pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.dispatch_workgroups(gx, gy, 1);
            }
            self.queue.submit(std::iter::once(encoder.finish()));
        });

        match err {
            Some(e) => Err(DrawError::KernelLaunch(e.to_string())),
            None => Ok(()),
        }
    }

    fn read_buffer(&self, buffer: &Self::Buffer, out: &mut [u8]) -> DrawResult<()> {
        if !buffer.access.host_readable() {
            return Err(DrawError::BufferRead("buffer is kernel read-only".into()));
        }
        let len = out.len() as u64;
        let size = len.div_ceil(wgpu::COPY_BUFFER_ALIGNMENT) * wgpu::COPY_BUFFER_ALIGNMENT;
        if size > buffer.size {
            return Err(DrawError::BufferRead(format!(
                "requested {len} bytes from {} byte buffer",
                buffer.size
            )));
        }
        if size == 0 {
            return Ok(());
        }

        // Create staging buffer
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        // Copy to staging
        let mut encoder = self.device.create_command_encoder(&Default::default());
        encoder.copy_buffer_to_buffer(&buffer.buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        // Map and read; waiting here also drains every earlier submission
        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| DrawError::BufferRead("map channel closed".into()))?
            .map_err(|e| DrawError::BufferRead(format!("map failed: {e}")))?;

        {
            let data = slice.get_mapped_range();
            out.copy_from_slice(&data[..out.len()]);
        }
        staging.unmap();
        Ok(())
    }

    fn limits(&self) -> &GpuLimits {
        &self.limits
    }

    fn name(&self) -> &'static str {
        "wgpu"
    }
}

/// Storage usage plus the copy direction the host needs.
///
/// Outputs also take `COPY_DST` because each launch clears them first.
fn buffer_usage(access: BufferAccess) -> wgpu::BufferUsages {
    match access {
        BufferAccess::ReadOnly => wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        BufferAccess::WriteOnly => {
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST
        }
    }
}

// =============================================================================
// VRAM Detection
// =============================================================================

fn estimate_vram(info: &wgpu::AdapterInfo, max_buffer_bytes: u64) -> u64 {
    let from_buffer = max_buffer_bytes.saturating_mul(2);

    let estimated = match info.device_type {
        wgpu::DeviceType::DiscreteGpu => from_buffer.clamp(2u64 << 30, 24u64 << 30),
        wgpu::DeviceType::IntegratedGpu => from_buffer.clamp(512u64 << 20, 4u64 << 30),
        _ => from_buffer.clamp(256u64 << 20, 2u64 << 30),
    };

    // 80% safe margin
    estimated.saturating_mul(80) / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_follows_access() {
        let input = buffer_usage(BufferAccess::ReadOnly);
        assert!(input.contains(wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST));
        assert!(!input.contains(wgpu::BufferUsages::COPY_SRC));

        let output = buffer_usage(BufferAccess::WriteOnly);
        assert!(output.contains(wgpu::BufferUsages::COPY_SRC));
        assert!(output.contains(wgpu::BufferUsages::COPY_DST));
    }
}
