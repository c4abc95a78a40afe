//! Per-pixel drawing logic.
//!
//! Host-side twin of the WGSL kernels in `shaders`. The membership tests
//! and the shading rule here are what [`CpuPrimitives`](crate::CpuPrimitives)
//! executes, and [`render_reference`] runs them in a plain raster loop as
//! the scalar reference every backend must match byte for byte.

use vfx_core::{Frame, PLANE_A, PLANE_U, PLANE_V, PLANE_Y};

use crate::DrawResult;
use crate::backend::KernelKind;
use crate::layout::PlaneLayout;
use crate::params::KernelParams;
use crate::request::DrawRequest;

/// Box border membership.
///
/// Strict comparisons: the row `y == by` and column `x == bx` are never
/// part of the border.
#[inline]
pub fn box_contains(x: i32, y: i32, thickness: i32, bx: i32, by: i32, bw: i32, bh: i32) -> bool {
    y > by
        && y < by + bh
        && x > bx
        && x < bx + bw
        && (y - by < thickness
            || by + bh - 1 - y < thickness
            || x - bx < thickness
            || bx + bw - 1 - x < thickness)
}

/// Grid line membership. The lattice is unbounded and origin-relative.
#[inline]
pub fn grid_contains(x: i32, y: i32, thickness: i32, gx: i32, gy: i32, gw: i32, gh: i32) -> bool {
    let mut mx = (x - gx) % gw;
    let mut my = (y - gy) % gh;
    if mx < 0 {
        mx += gw;
    }
    if my < 0 {
        my += gh;
    }
    mx < thickness || my < thickness
}

/// Membership of `(x, y)` for the kernel `kind`.
#[inline]
pub fn contains(kind: KernelKind, p: &KernelParams, x: i32, y: i32) -> bool {
    match kind {
        KernelKind::DrawBox => box_contains(x, y, p.thickness, p.rx, p.ry, p.rw, p.rh),
        KernelKind::DrawGrid => grid_contains(x, y, p.thickness, p.rx, p.ry, p.rw, p.rh),
    }
}

/// `(1 - a/255) * src + (a/255) * color`, rounded to nearest.
#[inline]
pub fn blend(src: u8, color: u8, alpha: u8) -> u8 {
    let (s, c, a) = (src as u32, color as u32, alpha as u32);
    ((s * (255 - a) + c * a + 127) / 255) as u8
}

/// Whether `(x, y)` is the last pixel of its chroma block in raster order.
///
/// Exactly one pixel per chroma sample passes this test, so parallel
/// executors write each chroma byte once and agree with a raster loop.
#[inline]
pub fn chroma_owner(p: &KernelParams, x: i32, y: i32) -> bool {
    let last_x = ((((x >> p.hsub) + 1) << p.hsub).min(p.width)) - 1;
    let last_y = ((((y >> p.vsub) + 1) << p.vsub).min(p.height)) - 1;
    x == last_x && y == last_y
}

/// Samples of one pixel: luma, the chroma pair it maps to, alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    pub y: u8,
    pub u: u8,
    pub v: u8,
    /// Ignored on frames without alpha.
    pub a: u8,
}

/// Output samples for a pixel with source samples `src`.
///
/// Unmarked pixels pass through. Marked pixels are luma-inverted, painted
/// (frames with alpha) or blended by the color's alpha (frames without).
#[inline]
pub fn shade(p: &KernelParams, color: [u8; 4], marked: bool, src: Pixel) -> Pixel {
    if !marked {
        return src;
    }
    let [cy, cu, cv, ca] = color;
    if p.inverts() {
        Pixel { y: 255 - src.y, ..src }
    } else if p.has_alpha() {
        Pixel { y: cy, u: cu, v: cv, a: ca }
    } else {
        Pixel {
            y: blend(src.y, cy, ca),
            u: blend(src.u, cu, ca),
            v: blend(src.v, cv, ca),
            a: src.a,
        }
    }
}

/// Sequential scalar rendering of `request` onto a copy of `frame`.
///
/// Every pixel writes its luma, its chroma pair and its alpha in raster
/// order; later writes to a shared chroma sample replace earlier ones.
pub fn render_reference(frame: &Frame, request: &DrawRequest) -> DrawResult<Frame> {
    request.validate()?;
    let layout = PlaneLayout::for_frame(frame);
    let p = KernelParams::new(request, &layout);
    let kind = request.mode.kernel();
    let color = request.color.to_bytes();
    let mut out = frame.clone();

    for y in 0..frame.height() {
        for x in 0..frame.width() {
            let (cx, cy) = (x >> p.hsub, y >> p.vsub);
            let src = Pixel {
                y: frame.plane(PLANE_Y).get(x, y),
                u: frame.plane(PLANE_U).get(cx, cy),
                v: frame.plane(PLANE_V).get(cx, cy),
                a: if p.has_alpha() { frame.plane(PLANE_A).get(x, y) } else { 0 },
            };
            let marked = contains(kind, &p, x as i32, y as i32);
            let px = shade(&p, color, marked, src);

            out.plane_mut(PLANE_Y).set(x, y, px.y);
            out.plane_mut(PLANE_U).set(cx, cy, px.u);
            out.plane_mut(PLANE_V).set(cx, cy, px.v);
            if p.has_alpha() {
                out.plane_mut(PLANE_A).set(x, y, px.a);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{BoxGeometry, GridGeometry};
    use vfx_core::{PixelFormat, YuvaColor};

    fn params(has_alpha: bool, invert: bool) -> KernelParams {
        KernelParams {
            have_alpha: has_alpha as i32,
            invert_color: invert as i32,
            ..KernelParams::default()
        }
    }

    #[test]
    fn test_box_edge_band() {
        let inside = |x, y| box_contains(x, y, 2, 10, 10, 20, 20);
        assert!(!inside(10, 10));
        assert!(inside(11, 11));
        assert!(!inside(15, 15));
        assert!(!inside(20, 15));
        // right band is x in {28, 29}
        assert!(inside(28, 15));
        assert!(inside(29, 15));
        assert!(!inside(30, 15));
        assert!(!inside(27, 15));
    }

    #[test]
    fn test_box_thickness_zero_marks_nothing() {
        for y in 0..40 {
            for x in 0..40 {
                assert!(!box_contains(x, y, 0, 10, 10, 20, 20));
            }
        }
    }

    #[test]
    fn test_grid_period() {
        let on = |x, y| grid_contains(x, y, 1, 0, 0, 10, 10);
        assert!(on(0, 5));
        assert!(on(20, 7));
        assert!(on(5, 30));
        assert!(!on(5, 5));
        assert!(!on(11, 19));
    }

    #[test]
    fn test_grid_shifted_origin() {
        let on = |x, y| grid_contains(x, y, 1, 3, 0, 10, 10);
        assert!(on(3, 5));
        assert!(on(13, 5));
        assert!(!on(0, 5));
        assert!(!on(10, 5));
        // x - gx negative wraps back into the period
        assert!(!on(2, 5));
        assert!(grid_contains(2, 5, 1, 12, 1, 10, 10));
        assert!(grid_contains(-7, 5, 1, 3, 1, 10, 10));
    }

    #[test]
    fn test_blend_law() {
        assert_eq!(blend(200, 0, 128), 100);
        for s in [0u8, 1, 77, 128, 254, 255] {
            assert_eq!(blend(s, 99, 0), s);
            assert_eq!(blend(s, 99, 255), 99);
        }
    }

    #[test]
    fn test_shade_modes() {
        let src = Pixel { y: 200, u: 100, v: 50, a: 10 };
        let color = [0, 128, 128, 128];

        let inv = shade(&params(false, true), color, true, src);
        assert_eq!(inv, Pixel { y: 55, ..src });

        let paint = shade(&params(true, false), color, true, src);
        assert_eq!(paint, Pixel { y: 0, u: 128, v: 128, a: 128 });

        let mixed = shade(&params(false, false), color, true, src);
        assert_eq!(mixed.y, 100);
        assert_eq!(mixed.a, 10);

        assert_eq!(shade(&params(true, false), color, false, src), src);
    }

    #[test]
    fn test_chroma_owner_clamps_to_frame() {
        let p = KernelParams { width: 5, height: 3, hsub: 1, vsub: 1, ..KernelParams::default() };
        assert!(chroma_owner(&p, 1, 1));
        assert!(!chroma_owner(&p, 0, 1));
        assert!(!chroma_owner(&p, 1, 0));
        // odd width: the last column owns its chroma alone
        assert!(chroma_owner(&p, 4, 1));
        // odd height: the last row owns its chroma alone
        assert!(chroma_owner(&p, 3, 2));
        assert!(!chroma_owner(&p, 2, 2));
    }

    #[test]
    fn test_reference_outside_unchanged() {
        let mut frame = Frame::new(PixelFormat::Yuv444p, 16, 16).unwrap();
        for (i, b) in frame.plane_mut(PLANE_Y).data_mut().iter_mut().enumerate() {
            *b = i as u8;
        }
        let request = DrawRequest::draw_box(BoxGeometry::new(2, 2, 10, 10))
            .with_thickness(1)
            .with_invert(true);
        let out = render_reference(&frame, &request).unwrap();

        for y in 0..16 {
            for x in 0..16 {
                let before = frame.plane(PLANE_Y).get(x, y);
                let after = out.plane(PLANE_Y).get(x, y);
                if box_contains(x as i32, y as i32, 1, 2, 2, 10, 10) {
                    assert_eq!(after, 255 - before);
                } else {
                    assert_eq!(after, before);
                }
            }
        }
        assert_eq!(out.plane(PLANE_U), frame.plane(PLANE_U));
    }

    #[test]
    fn test_reference_chroma_last_writer() {
        // 2x2 block whose bottom-right pixel lies on a grid line
        let frame = Frame::filled(PixelFormat::Yuv420p, 2, 2, [50, 60, 70, 0]).unwrap();
        let request = DrawRequest::draw_grid(GridGeometry::new(1, 1, 2, 2))
            .with_color(YuvaColor::new(0, 0, 0, 255));
        let out = render_reference(&frame, &request).unwrap();
        assert_eq!(out.plane(PLANE_U).get(0, 0), 0);

        // bottom-right pixel off the lattice: its copy of the source wins
        let request = DrawRequest::draw_grid(GridGeometry::new(0, 0, 2, 2))
            .with_color(YuvaColor::new(0, 0, 0, 255));
        let out = render_reference(&frame, &request).unwrap();
        assert_eq!(out.plane(PLANE_U).get(0, 0), 60);
    }

    #[test]
    fn test_reference_rejects_bad_request() {
        let frame = Frame::new(PixelFormat::Yuv420p, 4, 4).unwrap();
        let request = DrawRequest::draw_grid(GridGeometry::new(0, 0, 0, 4));
        assert!(render_reference(&frame, &request).is_err());
    }
}
