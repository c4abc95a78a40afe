//! Packed device layout of a planar frame.
//!
//! Device buffers hold every plane back to back with no row padding:
//!
//! ```text
//! | Y: width*height | U: cw*ch | V: cw*ch | A: width*height (yuva only) |
//! 0                 u_offset   v_offset   a_offset                      total
//! ```
//!
//! The buffer itself is rounded up to a 4-byte multiple because device
//! copies and 32-bit storage words require it.

use vfx_core::{Frame, PixelFormat};

use crate::DrawResult;

/// Device copy alignment in bytes.
pub const BUFFER_ALIGN: usize = 4;

/// Byte geometry of one frame in device memory.
///
/// Two layouts compare equal exactly when buffers allocated for one can be
/// reused for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaneLayout {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub chroma_width: u32,
    pub chroma_height: u32,
}

impl PlaneLayout {
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Self {
        Self {
            format,
            width,
            height,
            chroma_width: format.chroma_width(width),
            chroma_height: format.chroma_height(height),
        }
    }

    pub fn for_frame(frame: &Frame) -> Self {
        Self::new(frame.format(), frame.width(), frame.height())
    }

    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.format.has_alpha()
    }

    /// Bytes of the luma plane (and of the alpha plane, when present).
    #[inline]
    pub fn luma_bytes(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes of one chroma plane.
    #[inline]
    pub fn chroma_bytes(&self) -> usize {
        self.chroma_width as usize * self.chroma_height as usize
    }

    #[inline]
    pub fn u_offset(&self) -> usize {
        self.luma_bytes()
    }

    #[inline]
    pub fn v_offset(&self) -> usize {
        self.u_offset() + self.chroma_bytes()
    }

    #[inline]
    pub fn a_offset(&self) -> usize {
        self.v_offset() + self.chroma_bytes()
    }

    /// Meaningful bytes: all planes, no padding.
    pub fn total_bytes(&self) -> usize {
        let alpha = if self.has_alpha() { self.luma_bytes() } else { 0 };
        self.a_offset() + alpha
    }

    /// Size to allocate on the device.
    pub fn buffer_bytes(&self) -> usize {
        self.total_bytes().div_ceil(BUFFER_ALIGN) * BUFFER_ALIGN
    }

    /// `(offset, plane width, plane height)` for each plane in Y, U, V[, A] order.
    pub fn planes(&self) -> Vec<(usize, u32, u32)> {
        let mut planes = vec![
            (0, self.width, self.height),
            (self.u_offset(), self.chroma_width, self.chroma_height),
            (self.v_offset(), self.chroma_width, self.chroma_height),
        ];
        if self.has_alpha() {
            planes.push((self.a_offset(), self.width, self.height));
        }
        planes
    }

    /// Whether `frame` has this layout.
    pub fn matches(&self, frame: &Frame) -> bool {
        *self == Self::for_frame(frame)
    }

    fn check(&self, frame: &Frame) -> DrawResult<()> {
        if frame.format() != self.format {
            return Err(vfx_core::Error::unsupported_format(format!(
                "frame is {}, layout expects {}",
                frame.format(),
                self.format
            ))
            .into());
        }
        if frame.width() != self.width || frame.height() != self.height {
            return Err(vfx_core::Error::dimension_mismatch(
                (self.width, self.height),
                (frame.width(), frame.height()),
            )
            .into());
        }
        Ok(())
    }

    /// Packs `frame` into `out`, resized to [`buffer_bytes`](Self::buffer_bytes)
    /// with zeroed tail padding.
    pub fn pack_into(&self, frame: &Frame, out: &mut Vec<u8>) -> DrawResult<()> {
        self.check(frame)?;
        out.clear();
        out.resize(self.buffer_bytes(), 0);
        for (plane, (offset, width, height)) in frame.planes().iter().zip(self.planes()) {
            let w = width as usize;
            for y in 0..height {
                let start = offset + y as usize * w;
                out[start..start + w].copy_from_slice(plane.row(y));
            }
        }
        Ok(())
    }

    /// Scatters packed `data` into `frame`, honoring its row strides.
    /// Row padding in `frame` is left untouched.
    pub fn unpack_into(&self, data: &[u8], frame: &mut Frame) -> DrawResult<()> {
        self.check(frame)?;
        if data.len() < self.total_bytes() {
            return Err(crate::DrawError::BufferSizeMismatch {
                expected: self.total_bytes(),
                actual: data.len(),
            });
        }
        for (index, (offset, width, height)) in self.planes().into_iter().enumerate() {
            let w = width as usize;
            let plane = frame.plane_mut(index);
            for y in 0..height {
                let start = offset + y as usize * w;
                plane.row_mut(y).copy_from_slice(&data[start..start + w]);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vfx_core::{PLANE_A, PLANE_U, PLANE_Y};

    #[test]
    fn test_offsets_420() {
        let layout = PlaneLayout::new(PixelFormat::Yuv420p, 5, 3);
        assert_eq!((layout.chroma_width, layout.chroma_height), (3, 2));
        assert_eq!(layout.u_offset(), 15);
        assert_eq!(layout.v_offset(), 21);
        assert_eq!(layout.total_bytes(), 27);
        assert_eq!(layout.buffer_bytes(), 28);
    }

    #[test]
    fn test_alpha_appended() {
        let layout = PlaneLayout::new(PixelFormat::Yuva444p, 2, 2);
        assert_eq!(layout.a_offset(), 12);
        assert_eq!(layout.total_bytes(), 16);
        assert_eq!(layout.planes().len(), 4);
    }

    #[test]
    fn test_geometry_equality() {
        let a = PlaneLayout::new(PixelFormat::Yuv420p, 64, 32);
        assert_eq!(a, PlaneLayout::new(PixelFormat::Yuv420p, 64, 32));
        assert_ne!(a, PlaneLayout::new(PixelFormat::Yuv422p, 64, 32));
        assert_ne!(a, PlaneLayout::new(PixelFormat::Yuv420p, 64, 34));
    }

    #[test]
    fn test_pack_strips_stride_padding() {
        let mut frame = Frame::with_strides(PixelFormat::Yuva420p, 3, 2, &[8, 4, 4, 8]).unwrap();
        frame.plane_mut(PLANE_Y).row_mut(1).copy_from_slice(&[7, 8, 9]);
        frame.plane_mut(PLANE_U).fill(100);
        frame.plane_mut(PLANE_A).fill(255);

        let layout = PlaneLayout::for_frame(&frame);
        let mut packed = Vec::new();
        layout.pack_into(&frame, &mut packed).unwrap();

        assert_eq!(packed.len(), layout.buffer_bytes());
        assert_eq!(&packed[..6], &[0, 0, 0, 7, 8, 9]);
        assert_eq!(&packed[6..8], &[100, 100]);
        assert_eq!(&packed[layout.a_offset()..layout.total_bytes()], &[255; 6]);
        assert_eq!(&packed[..layout.total_bytes()], frame.to_packed().as_slice());
    }

    #[test]
    fn test_unpack_keeps_row_padding() {
        let mut frame = Frame::with_strides(PixelFormat::Yuv444p, 2, 1, &[4, 4, 4]).unwrap();
        frame.plane_mut(PLANE_Y).data_mut()[3] = 42;

        let layout = PlaneLayout::for_frame(&frame);
        layout.unpack_into(&[1, 2, 3, 4, 5, 6], &mut frame).unwrap();

        assert_eq!(frame.plane(PLANE_Y).row(0), &[1, 2]);
        assert_eq!(frame.plane(PLANE_Y).data()[3], 42);
        assert_eq!(frame.plane(2).row(0), &[5, 6]);
    }

    #[test]
    fn test_mismatched_frame_rejected() {
        let layout = PlaneLayout::new(PixelFormat::Yuv420p, 4, 4);
        let frame = Frame::new(PixelFormat::Yuv420p, 4, 6).unwrap();
        let mut out = Vec::new();
        assert!(layout.pack_into(&frame, &mut out).is_err());
        assert!(!layout.matches(&frame));
    }
}
