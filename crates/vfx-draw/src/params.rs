//! Scalar kernel arguments.
//!
//! Both kernels take the same positional list after the three buffers:
//!
//! ```text
//! have_alpha, invert_color, thickness, width, height, cw, ch, hsub, vsub,
//! then x, y, w, h        (drawbox: box origin and extent)
//! or   gx, gy, gw, gh    (drawgrid: grid origin and period)
//! ```
//!
//! [`KernelParams`] is that list as one uniform block. Its field order is
//! the WGSL `DrawParams` order; a test below keeps the two in sync.

use bytemuck::{Pod, Zeroable};

use crate::layout::PlaneLayout;
use crate::request::DrawRequest;

/// Uniform block shared by `drawbox` and `drawgrid`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct KernelParams {
    pub have_alpha: i32,
    pub invert_color: i32,
    pub thickness: i32,
    pub width: i32,
    pub height: i32,
    pub cw: i32,
    pub ch: i32,
    pub hsub: i32,
    pub vsub: i32,
    /// Box x or grid origin x.
    pub rx: i32,
    /// Box y or grid origin y.
    pub ry: i32,
    /// Box width or grid period x.
    pub rw: i32,
    /// Box height or grid period y.
    pub rh: i32,
    pub _pad0: i32,
    pub _pad1: i32,
    pub _pad2: i32,
}

const _: () = assert!(std::mem::size_of::<KernelParams>() == 64);

impl KernelParams {
    /// Field names in declaration order.
    pub const FIELDS: [&'static str; 16] = [
        "have_alpha",
        "invert_color",
        "thickness",
        "width",
        "height",
        "cw",
        "ch",
        "hsub",
        "vsub",
        "rx",
        "ry",
        "rw",
        "rh",
        "_pad0",
        "_pad1",
        "_pad2",
    ];

    /// Marshals `request` for a frame with `layout`.
    ///
    /// Frame dimensions are bounded by `vfx_core::Frame` to half the i32
    /// range, so the casts are lossless.
    pub fn new(request: &DrawRequest, layout: &PlaneLayout) -> Self {
        let [rx, ry, rw, rh] = request.mode.bounds();
        Self {
            have_alpha: layout.has_alpha() as i32,
            invert_color: request.invert_color as i32,
            thickness: request.thickness,
            width: layout.width as i32,
            height: layout.height as i32,
            cw: layout.chroma_width as i32,
            ch: layout.chroma_height as i32,
            hsub: layout.format.log2_chroma_w() as i32,
            vsub: layout.format.log2_chroma_h() as i32,
            rx,
            ry,
            rw,
            rh,
            ..Self::default()
        }
    }

    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.have_alpha != 0
    }

    #[inline]
    pub fn inverts(&self) -> bool {
        self.invert_color != 0
    }

    /// Raw bytes for a uniform upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{BoxGeometry, GridGeometry};
    use crate::shaders;
    use vfx_core::{PixelFormat, YuvaColor};

    /// Field names of `struct DrawParams` in the WGSL source.
    fn wgsl_fields(source: &str) -> Vec<String> {
        let start = source.find("struct DrawParams").expect("DrawParams declared");
        let body = &source[start..];
        let open = body.find('{').unwrap();
        let close = body.find('}').unwrap();
        body[open + 1..close]
            .split(',')
            .filter_map(|field| field.split(':').next())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }

    #[test]
    fn test_fields_match_wgsl() {
        let fields = wgsl_fields(shaders::DRAW_KERNELS);
        assert_eq!(fields, KernelParams::FIELDS);
    }

    #[test]
    fn test_box_marshalling() {
        let request = DrawRequest::draw_box(BoxGeometry::new(10, 20, 30, 40))
            .with_thickness(2)
            .with_color(YuvaColor::new(1, 2, 3, 4))
            .with_invert(true);
        let layout = PlaneLayout::new(PixelFormat::Yuv420p, 101, 51);
        let p = KernelParams::new(&request, &layout);

        assert_eq!(p.have_alpha, 0);
        assert_eq!(p.invert_color, 1);
        assert_eq!(p.thickness, 2);
        assert_eq!((p.width, p.height, p.cw, p.ch), (101, 51, 51, 26));
        assert_eq!((p.hsub, p.vsub), (1, 1));
        assert_eq!((p.rx, p.ry, p.rw, p.rh), (10, 20, 30, 40));
    }

    #[test]
    fn test_grid_alpha_marshalling() {
        let request = DrawRequest::draw_grid(GridGeometry::new(-3, 5, 16, 8));
        let layout = PlaneLayout::new(PixelFormat::Yuva422p, 32, 16);
        let p = KernelParams::new(&request, &layout);

        assert!(p.has_alpha());
        assert!(!p.inverts());
        assert_eq!((p.hsub, p.vsub), (1, 0));
        assert_eq!((p.rx, p.ry, p.rw, p.rh), (-3, 5, 16, 8));
        assert_eq!(p.as_bytes().len(), 64);
    }
}
