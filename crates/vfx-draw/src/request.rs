//! Per-frame draw requests.
//!
//! A [`DrawRequest`] says what to draw; frame-derived values (alpha plane,
//! chroma shifts) come from the frame itself when the request is marshalled
//! into [`KernelParams`](crate::params::KernelParams).

use vfx_core::YuvaColor;

use crate::backend::KernelKind;
use crate::kernels;
use crate::{DrawError, DrawResult};

/// Default border thickness of a box.
pub const DEFAULT_BOX_THICKNESS: i32 = 3;
/// Default line width of a grid.
pub const DEFAULT_GRID_THICKNESS: i32 = 1;

const COORD_LIMIT: i32 = i32::MAX / 2;

/// Box bounds: origin and extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxGeometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoxGeometry {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Whether `(x, y)` lies on the border band of width `thickness`.
    #[inline]
    pub fn contains(&self, x: i32, y: i32, thickness: i32) -> bool {
        kernels::box_contains(x, y, thickness, self.x, self.y, self.width, self.height)
    }
}

/// Grid lattice: origin and repeat period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridGeometry {
    pub x: i32,
    pub y: i32,
    pub period_x: i32,
    pub period_y: i32,
}

impl GridGeometry {
    pub const fn new(x: i32, y: i32, period_x: i32, period_y: i32) -> Self {
        Self { x, y, period_x, period_y }
    }

    /// Whether `(x, y)` lies on a grid line of width `thickness`.
    #[inline]
    pub fn contains(&self, x: i32, y: i32, thickness: i32) -> bool {
        kernels::grid_contains(x, y, thickness, self.x, self.y, self.period_x, self.period_y)
    }
}

/// What gets drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Rectangular border.
    Box(BoxGeometry),
    /// Infinite periodic lattice of horizontal and vertical lines.
    Grid(GridGeometry),
}

impl RenderMode {
    /// Kernel that renders this mode.
    pub const fn kernel(&self) -> KernelKind {
        match self {
            Self::Box(_) => KernelKind::DrawBox,
            Self::Grid(_) => KernelKind::DrawGrid,
        }
    }

    /// The four trailing kernel arguments: `{x, y, w, h}` or `{gx, gy, gw, gh}`.
    pub const fn bounds(&self) -> [i32; 4] {
        match *self {
            Self::Box(b) => [b.x, b.y, b.width, b.height],
            Self::Grid(g) => [g.x, g.y, g.period_x, g.period_y],
        }
    }

    /// Membership test for pixel `(x, y)`.
    #[inline]
    pub fn contains(&self, x: i32, y: i32, thickness: i32) -> bool {
        match self {
            Self::Box(b) => b.contains(x, y, thickness),
            Self::Grid(g) => g.contains(x, y, thickness),
        }
    }
}

/// Immutable per-frame description of one overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawRequest {
    pub mode: RenderMode,
    /// Border width for boxes, line width for grids.
    pub thickness: i32,
    /// Overlay color; its alpha is the blend factor on frames without alpha.
    pub color: YuvaColor,
    /// Invert luma of marked pixels instead of painting.
    pub invert_color: bool,
}

impl DrawRequest {
    /// Opaque black box border, 3 pixels thick.
    pub fn draw_box(geometry: BoxGeometry) -> Self {
        Self {
            mode: RenderMode::Box(geometry),
            thickness: DEFAULT_BOX_THICKNESS,
            color: YuvaColor::new(16, 128, 128, 255),
            invert_color: false,
        }
    }

    /// Opaque black grid, 1 pixel lines.
    pub fn draw_grid(geometry: GridGeometry) -> Self {
        Self {
            mode: RenderMode::Grid(geometry),
            thickness: DEFAULT_GRID_THICKNESS,
            color: YuvaColor::new(16, 128, 128, 255),
            invert_color: false,
        }
    }

    pub fn with_thickness(mut self, thickness: i32) -> Self {
        self.thickness = thickness;
        self
    }

    pub fn with_color(mut self, color: YuvaColor) -> Self {
        self.color = color;
        self
    }

    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert_color = invert;
        self
    }

    /// Rejects requests the kernels cannot evaluate safely.
    ///
    /// Kernels use 32-bit signed arithmetic on `x - origin` and
    /// `origin + extent`, so every coordinate is limited to half the i32
    /// range, extents must be non-negative and grid periods positive.
    pub fn validate(&self) -> DrawResult<()> {
        if self.thickness < 0 {
            return Err(DrawError::InvalidRequest(format!(
                "negative thickness {}",
                self.thickness
            )));
        }
        let [x, y, w, h] = self.mode.bounds();
        if !(-COORD_LIMIT..=COORD_LIMIT).contains(&x) || !(-COORD_LIMIT..=COORD_LIMIT).contains(&y) {
            return Err(DrawError::InvalidRequest(format!("origin ({x}, {y}) out of range")));
        }
        match self.mode {
            RenderMode::Box(_) => {
                if !(0..=COORD_LIMIT).contains(&w) || !(0..=COORD_LIMIT).contains(&h) {
                    return Err(DrawError::InvalidRequest(format!("box extent {w}x{h} out of range")));
                }
            }
            RenderMode::Grid(_) => {
                if w <= 0 || h <= 0 {
                    return Err(DrawError::InvalidRequest(format!(
                        "grid period must be positive, got {w}x{h}"
                    )));
                }
            }
        }
        Ok(())
    }
}
