//! Device buffers for one engine: packed input, packed output, color.
//!
//! Buffers are created on the first frame and reused while frames keep the
//! same [`PlaneLayout`]. A frame with a different layout releases them and
//! allocates a fresh set.

use tracing::{debug, trace};
use vfx_core::{Frame, YuvaColor};

use crate::backend::{BufferAccess, GpuPrimitives, KernelArgs};
use crate::layout::PlaneLayout;
use crate::params::KernelParams;
use crate::{DrawError, DrawResult};

/// Owner of the three device buffers.
pub struct BufferManager<P: GpuPrimitives> {
    input: Option<P::Buffer>,
    output: Option<P::Buffer>,
    color: Option<P::Buffer>,
    layout: Option<PlaneLayout>,
    /// Host-side packed copy, reused across frames.
    staging: Vec<u8>,
    allocations: usize,
}

impl<P: GpuPrimitives> Default for BufferManager<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: GpuPrimitives> BufferManager<P> {
    pub fn new() -> Self {
        Self {
            input: None,
            output: None,
            color: None,
            layout: None,
            staging: Vec::new(),
            allocations: 0,
        }
    }

    /// Layout the current buffers were sized for.
    pub fn layout(&self) -> Option<PlaneLayout> {
        self.layout
    }

    /// Number of device buffers created over the manager's lifetime.
    pub fn allocation_count(&self) -> usize {
        self.allocations
    }

    /// Whether all three buffers exist.
    pub fn is_allocated(&self) -> bool {
        self.input.is_some() && self.output.is_some() && self.color.is_some()
    }

    /// Allocates whatever is missing for `layout`.
    ///
    /// Existing buffers are kept when `layout` equals the recorded one and
    /// dropped otherwise.
    pub fn ensure_buffers(&mut self, device: &P, layout: PlaneLayout) -> DrawResult<()> {
        match self.layout {
            Some(current) if current == layout => {
                if self.is_allocated() {
                    return Ok(());
                }
            }
            Some(current) => {
                debug!(
                    from = %format_args!("{}x{} {}", current.width, current.height, current.format),
                    to = %format_args!("{}x{} {}", layout.width, layout.height, layout.format),
                    "frame geometry changed, reallocating buffers"
                );
                self.release();
            }
            None => {}
        }

        let size = layout.buffer_bytes() as u64;
        let limits = device.limits();
        if size > limits.max_buffer_bytes {
            return Err(DrawError::BufferCreation(format!(
                "{size} bytes exceeds device limit of {}",
                limits.max_buffer_bytes
            )));
        }
        // input + output + color
        let total = size.saturating_mul(2).saturating_add(4);
        if total > limits.available_memory {
            return Err(DrawError::BufferCreation(format!(
                "{total} bytes exceeds available device memory of {}",
                limits.available_memory
            )));
        }

        self.layout = Some(layout);
        if self.input.is_none() {
            self.input = Some(device.create_buffer(size, BufferAccess::ReadOnly, "draw_input")?);
            self.allocations += 1;
        }
        if self.output.is_none() {
            self.output = Some(device.create_buffer(size, BufferAccess::WriteOnly, "draw_output")?);
            self.allocations += 1;
        }
        if self.color.is_none() {
            self.color = Some(device.create_buffer(4, BufferAccess::ReadOnly, "draw_color")?);
            self.allocations += 1;
        }
        debug!(bytes = size, backend = device.name(), "allocated draw buffers");
        Ok(())
    }

    /// Writes the frame planes, then the color.
    pub fn upload(&mut self, device: &P, frame: &Frame, color: YuvaColor) -> DrawResult<()> {
        let layout = self.layout.ok_or(DrawError::NotInitialized)?;
        let (Some(input), Some(color_buf)) = (self.input.as_mut(), self.color.as_mut()) else {
            return Err(DrawError::NotInitialized);
        };

        layout.pack_into(frame, &mut self.staging)?;
        device.write_buffer(input, 0, &self.staging)?;
        device.write_buffer(color_buf, 0, &color.to_bytes())?;
        trace!(bytes = self.staging.len(), "uploaded frame");
        Ok(())
    }

    /// Reads the output buffer into `frame`.
    ///
    /// Synchronizing: blocks until every launch queued on `device` has
    /// finished, so the data read is the complete result.
    pub fn download(&mut self, device: &P, frame: &mut Frame) -> DrawResult<()> {
        let layout = self.layout.ok_or(DrawError::NotInitialized)?;
        let output = self.output.as_ref().ok_or(DrawError::NotInitialized)?;

        self.staging.resize(layout.buffer_bytes(), 0);
        device.read_buffer(output, &mut self.staging)?;
        layout.unpack_into(&self.staging, frame)?;
        trace!(bytes = self.staging.len(), "downloaded frame");
        Ok(())
    }

    /// Borrows the buffers as launch arguments.
    pub fn kernel_args(&mut self, params: KernelParams) -> DrawResult<KernelArgs<'_, P::Buffer>> {
        match (&self.input, &mut self.output, &self.color) {
            (Some(src), Some(dst), Some(color)) => Ok(KernelArgs { src, dst, color, params }),
            _ => Err(DrawError::NotInitialized),
        }
    }

    /// Drops all buffers. Safe on an empty or partial set.
    pub fn release(&mut self) {
        if self.input.is_some() || self.output.is_some() || self.color.is_some() {
            debug!("releasing draw buffers");
        }
        self.input = None;
        self.output = None;
        self.color = None;
        self.layout = None;
        self.staging = Vec::new();
    }
}
