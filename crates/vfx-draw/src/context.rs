//! Device context: compute device, compiled program, kernel handles.
//!
//! Every piece is optional so a context can be torn down from any partial
//! state, including after a failed [`DeviceContext::initialize`].

use tracing::{debug, error};

use crate::backend::{GpuPrimitives, KernelKind};
use crate::shaders;
use crate::{DrawError, DrawResult};

/// Owner of the device-side objects of one engine.
pub struct DeviceContext<P: GpuPrimitives> {
    device: Option<P>,
    program: Option<P::Program>,
    drawbox: Option<P::Kernel>,
    drawgrid: Option<P::Kernel>,
}

impl<P: GpuPrimitives> Default for DeviceContext<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: GpuPrimitives> DeviceContext<P> {
    /// Empty context; nothing acquired yet.
    pub fn new() -> Self {
        Self {
            device: None,
            program: None,
            drawbox: None,
            drawgrid: None,
        }
    }

    /// Context around an already acquired device.
    pub fn with_device(device: P) -> Self {
        Self {
            device: Some(device),
            ..Self::new()
        }
    }

    /// Acquires the device (via `acquire`, only if none is held), compiles
    /// the draw program once and creates whichever kernels are missing.
    ///
    /// Repeated calls on a fully initialized context do nothing.
    pub fn initialize<F>(&mut self, acquire: F) -> DrawResult<()>
    where
        F: FnOnce() -> DrawResult<P>,
    {
        if self.device.is_none() {
            let device = acquire().inspect_err(|e| error!("Unable to acquire compute device: {e}"))?;
            debug!(backend = device.name(), "acquired compute device");
            self.device = Some(device);
        }
        let Some(device) = self.device.as_ref() else {
            return Err(DrawError::NotInitialized);
        };

        if self.program.is_none() {
            let program = device
                .compile_program(shaders::DRAW_KERNELS)
                .inspect_err(|e| error!("failed to compile program 'draw_kernels': {e}"))?;
            self.program = Some(program);
        }
        let Some(program) = self.program.as_ref() else {
            return Err(DrawError::NotInitialized);
        };

        for kind in KernelKind::ALL {
            let slot = match kind {
                KernelKind::DrawBox => &mut self.drawbox,
                KernelKind::DrawGrid => &mut self.drawgrid,
            };
            if slot.is_none() {
                let kernel = device
                    .create_kernel(program, kind)
                    .inspect_err(|e| error!("failed to create kernel '{kind}': {e}"))?;
                *slot = Some(kernel);
            }
        }
        debug!(backend = device.name(), "draw kernels ready");
        Ok(())
    }

    /// Whether device, program and both kernels exist.
    pub fn is_initialized(&self) -> bool {
        self.device.is_some() && self.program.is_some() && self.drawbox.is_some() && self.drawgrid.is_some()
    }

    pub fn device(&self) -> DrawResult<&P> {
        self.device.as_ref().ok_or(DrawError::NotInitialized)
    }

    /// Kernel handle for `kind`.
    pub fn kernel(&self, kind: KernelKind) -> DrawResult<&P::Kernel> {
        match kind {
            KernelKind::DrawBox => self.drawbox.as_ref(),
            KernelKind::DrawGrid => self.drawgrid.as_ref(),
        }
        .ok_or(DrawError::NotInitialized)
    }

    /// Releases kernels, program and device, in that order. Idempotent.
    pub fn teardown(&mut self) {
        if self.device.is_some() || self.program.is_some() {
            debug!("tearing down device context");
        }
        self.drawbox = None;
        self.drawgrid = None;
        self.program = None;
        self.device = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuPrimitives;

    #[test]
    fn test_initialize_creates_everything() {
        let mut ctx = DeviceContext::<CpuPrimitives>::new();
        assert!(!ctx.is_initialized());
        ctx.initialize(|| Ok(CpuPrimitives::new())).unwrap();
        assert!(ctx.is_initialized());
        assert!(ctx.kernel(KernelKind::DrawBox).is_ok());
        assert!(ctx.kernel(KernelKind::DrawGrid).is_ok());
    }

    #[test]
    fn test_initialize_acquires_once() {
        let mut ctx = DeviceContext::<CpuPrimitives>::new();
        ctx.initialize(|| Ok(CpuPrimitives::new())).unwrap();
        ctx.initialize(|| panic!("device acquired twice")).unwrap();
    }

    #[test]
    fn test_failed_acquire_leaves_empty_context() {
        let mut ctx = DeviceContext::<CpuPrimitives>::new();
        let err = ctx.initialize(|| Err(DrawError::NoAdapter)).unwrap_err();
        assert!(matches!(err, DrawError::NoAdapter));
        assert!(ctx.device().is_err());
        ctx.teardown();
        ctx.teardown();
    }

    #[test]
    fn test_teardown_releases_all() {
        let mut ctx = DeviceContext::with_device(CpuPrimitives::new());
        ctx.initialize(|| Err(DrawError::NoAdapter)).unwrap();
        ctx.teardown();
        assert!(!ctx.is_initialized());
        assert!(matches!(ctx.kernel(KernelKind::DrawBox), Err(DrawError::NotInitialized)));
    }
}
