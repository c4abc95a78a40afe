//! Drawing engine: `init`, per-frame `process`, `uninit`.
//!
//! One engine processes one frame at a time: upload, launch, blocking
//! download. Device objects and buffers belong to the engine alone, so
//! independent engines can run side by side.

use tracing::{info, trace};
use vfx_core::Frame;

use crate::backend::{Backend, CpuPrimitives, GpuPrimitives};
use crate::buffers::BufferManager;
use crate::context::DeviceContext;
use crate::dispatch;
use crate::layout::PlaneLayout;
use crate::request::DrawRequest;
use crate::DrawResult;

#[cfg(feature = "wgpu")]
use crate::backend::WgpuPrimitives;

/// Box/grid overlay engine on device `P`.
pub struct DrawEngine<P: GpuPrimitives> {
    context: DeviceContext<P>,
    buffers: BufferManager<P>,
    frames: u64,
}

impl<P: GpuPrimitives> DrawEngine<P> {
    /// Acquires a device through `acquire` and prepares both kernels.
    pub fn init<F>(acquire: F) -> DrawResult<Self>
    where
        F: FnOnce() -> DrawResult<P>,
    {
        let mut engine = Self {
            context: DeviceContext::new(),
            buffers: BufferManager::new(),
            frames: 0,
        };
        engine.context.initialize(acquire)?;
        Ok(engine)
    }

    /// Engine on an already acquired device.
    pub fn with_device(device: P) -> DrawResult<Self> {
        Self::init(|| Ok(device))
    }

    /// Draws `request` onto a copy of `frame`.
    pub fn process(&mut self, frame: &Frame, request: &DrawRequest) -> DrawResult<Frame> {
        let mut out = frame.clone();
        self.process_into(frame, &mut out, request)?;
        Ok(out)
    }

    /// Draws `request` onto `src`, writing the result into `dst`.
    ///
    /// `dst` must have the geometry of `src`; its row strides may differ.
    pub fn process_into(&mut self, src: &Frame, dst: &mut Frame, request: &DrawRequest) -> DrawResult<()> {
        request.validate()?;
        if src.format() != dst.format() {
            return Err(vfx_core::Error::unsupported_format(format!(
                "destination is {}, source is {}",
                dst.format(),
                src.format()
            ))
            .into());
        }
        if !src.same_geometry(dst) {
            return Err(vfx_core::Error::dimension_mismatch(
                (src.width(), src.height()),
                (dst.width(), dst.height()),
            )
            .into());
        }

        let kind = request.mode.kernel();
        let device = self.context.device()?;
        let kernel = self.context.kernel(kind)?;

        self.buffers.ensure_buffers(device, PlaneLayout::for_frame(src))?;
        self.buffers.upload(device, src, request.color)?;
        dispatch::run(device, kind, kernel, &mut self.buffers, request)?;
        self.buffers.download(device, dst)?;

        self.frames += 1;
        trace!(frame = self.frames, kernel = %kind, "frame processed");
        Ok(())
    }

    /// Releases buffers, kernels, program and device. Idempotent.
    pub fn uninit(&mut self) {
        self.buffers.release();
        self.context.teardown();
    }

    /// Whether the engine can process frames.
    pub fn is_initialized(&self) -> bool {
        self.context.is_initialized()
    }

    pub fn device(&self) -> DrawResult<&P> {
        self.context.device()
    }

    pub fn buffers(&self) -> &BufferManager<P> {
        &self.buffers
    }

    /// Frames processed since `init`.
    pub fn frames_processed(&self) -> u64 {
        self.frames
    }
}

impl<P: GpuPrimitives> Drop for DrawEngine<P> {
    fn drop(&mut self) {
        self.uninit();
    }
}

/// Backend-erased engine interface.
pub trait FrameProcessor: Send {
    /// Name of the device backend.
    fn backend_name(&self) -> &'static str;

    /// See [`DrawEngine::process`].
    fn process(&mut self, frame: &Frame, request: &DrawRequest) -> DrawResult<Frame>;

    /// See [`DrawEngine::process_into`].
    fn process_into(&mut self, src: &Frame, dst: &mut Frame, request: &DrawRequest) -> DrawResult<()>;

    /// See [`DrawEngine::uninit`].
    fn uninit(&mut self);
}

impl<P: GpuPrimitives> FrameProcessor for DrawEngine<P> {
    fn backend_name(&self) -> &'static str {
        self.device().map(|d| d.name()).unwrap_or("none")
    }

    fn process(&mut self, frame: &Frame, request: &DrawRequest) -> DrawResult<Frame> {
        DrawEngine::process(self, frame, request)
    }

    fn process_into(&mut self, src: &Frame, dst: &mut Frame, request: &DrawRequest) -> DrawResult<()> {
        DrawEngine::process_into(self, src, dst, request)
    }

    fn uninit(&mut self) {
        DrawEngine::uninit(self)
    }
}

/// Create an engine on `backend`.
///
/// `Backend::Auto` honors `VFX_DRAW_BACKEND`, then prefers wgpu when an
/// adapter is present.
pub fn create_engine(backend: Backend) -> DrawResult<Box<dyn FrameProcessor>> {
    let resolved = backend.resolve();
    info!(requested = %backend, backend = %resolved, "creating draw engine");
    match resolved {
        Backend::Auto | Backend::Cpu => Ok(Box::new(DrawEngine::init(|| Ok(CpuPrimitives::new()))?)),
        Backend::Wgpu => {
            #[cfg(feature = "wgpu")]
            {
                Ok(Box::new(DrawEngine::init(WgpuPrimitives::new)?))
            }
            #[cfg(not(feature = "wgpu"))]
            {
                Err(crate::DrawError::BackendNotAvailable("wgpu feature not enabled".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DrawError;
    use crate::request::BoxGeometry;
    use vfx_core::PixelFormat;

    #[test]
    fn test_create_cpu_engine() {
        let mut engine = create_engine(Backend::Cpu).unwrap();
        assert_eq!(engine.backend_name(), "CPU");
        let frame = Frame::filled(PixelFormat::Yuv420p, 8, 8, [100, 128, 128, 0]).unwrap();
        let request = DrawRequest::draw_box(BoxGeometry::new(0, 0, 8, 8)).with_invert(true);
        let out = engine.process(&frame, &request).unwrap();
        assert_eq!(out.plane(0).get(1, 1), 155);
        assert_eq!(out.plane(0).get(0, 0), 100);
    }

    #[test]
    fn test_uninit_then_process_fails() {
        let mut engine = DrawEngine::with_device(CpuPrimitives::new()).unwrap();
        engine.uninit();
        engine.uninit();
        assert!(!engine.is_initialized());
        let frame = Frame::new(PixelFormat::Yuv444p, 4, 4).unwrap();
        let request = DrawRequest::draw_box(BoxGeometry::new(0, 0, 4, 4));
        let err = engine.process(&frame, &request).unwrap_err();
        assert!(matches!(err, DrawError::NotInitialized));
    }

    #[test]
    fn test_destination_geometry_checked() {
        let mut engine = DrawEngine::with_device(CpuPrimitives::new()).unwrap();
        let src = Frame::new(PixelFormat::Yuv420p, 8, 8).unwrap();
        let mut dst = Frame::new(PixelFormat::Yuv420p, 8, 6).unwrap();
        let request = DrawRequest::draw_box(BoxGeometry::new(0, 0, 4, 4));
        let err = engine.process_into(&src, &mut dst, &request).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Usage);
        assert_eq!(engine.frames_processed(), 0);
    }
}
