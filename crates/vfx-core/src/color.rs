//! Overlay colors.
//!
//! Colors are given as RGB(A) strings and converted to limited-range
//! BT.601 YUV, which is what planar video filters paint with.
//!
//! Accepted spellings: a named color (`red`, `white`, ...), `#RRGGBB`,
//! `#RRGGBBAA`, `0xRRGGBB`, `0xRRGGBBAA`, each optionally followed by
//! `@alpha` where alpha is a float in `[0, 1]` or a `0xAA` hex byte.
//!
//! ```rust
//! use vfx_core::color::{Rgba8, YuvaColor};
//!
//! let red = Rgba8::parse("red@0.5").unwrap();
//! assert_eq!(red.a, 127);
//! let yuv = YuvaColor::from_rgba(red);
//! assert_eq!(yuv.y, 81);
//! ```

use crate::error::{Error, Result};

const SCALEBITS: i32 = 10;
const ONE_HALF: i32 = 1 << (SCALEBITS - 1);

const fn fix(x: f64) -> i32 {
    (x * (1 << SCALEBITS) as f64 + 0.5) as i32
}

const NAMED: &[(&str, [u8; 3])] = &[
    ("black", [0x00, 0x00, 0x00]),
    ("white", [0xff, 0xff, 0xff]),
    ("red", [0xff, 0x00, 0x00]),
    ("green", [0x00, 0x80, 0x00]),
    ("lime", [0x00, 0xff, 0x00]),
    ("blue", [0x00, 0x00, 0xff]),
    ("yellow", [0xff, 0xff, 0x00]),
    ("cyan", [0x00, 0xff, 0xff]),
    ("magenta", [0xff, 0x00, 0xff]),
    ("gray", [0x80, 0x80, 0x80]),
    ("grey", [0x80, 0x80, 0x80]),
    ("silver", [0xc0, 0xc0, 0xc0]),
    ("orange", [0xff, 0xa5, 0x00]),
    ("pink", [0xff, 0xc0, 0xcb]),
    ("purple", [0x80, 0x00, 0x80]),
    ("navy", [0x00, 0x00, 0x80]),
    ("teal", [0x00, 0x80, 0x80]),
    ("maroon", [0x80, 0x00, 0x00]),
    ("olive", [0x80, 0x80, 0x00]),
];

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha, 255 = opaque.
    pub a: u8,
}

impl Rgba8 {
    /// Creates a color from components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses a color string.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (base, alpha) = match trimmed.split_once('@') {
            Some((base, alpha)) => (base, Some(alpha)),
            None => (trimmed, None),
        };

        let mut color = parse_base(input, base)?;
        if let Some(alpha) = alpha {
            color.a = parse_alpha(input, alpha)?;
        }
        Ok(color)
    }
}

fn parse_base(input: &str, base: &str) -> Result<Rgba8> {
    let lower = base.to_ascii_lowercase();
    let hex = lower
        .strip_prefix('#')
        .or_else(|| lower.strip_prefix("0x"));

    if let Some(hex) = hex {
        if hex.len() != 6 && hex.len() != 8 {
            return Err(Error::invalid_color(input, "expected 6 or 8 hex digits"));
        }
        // from_str_radix takes a sign
        if !is_hex(hex) {
            return Err(Error::invalid_color(input, "bad hex digits"));
        }
        let value = u32::from_str_radix(hex, 16)
            .map_err(|_| Error::invalid_color(input, "bad hex digits"))?;
        return Ok(if hex.len() == 6 {
            Rgba8::new((value >> 16) as u8, (value >> 8) as u8, value as u8, 0xff)
        } else {
            Rgba8::new((value >> 24) as u8, (value >> 16) as u8, (value >> 8) as u8, value as u8)
        });
    }

    NAMED
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, [r, g, b])| Rgba8::new(*r, *g, *b, 0xff))
        .ok_or_else(|| Error::invalid_color(input, "unknown color name"))
}

fn is_hex(digits: &str) -> bool {
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

fn parse_alpha(input: &str, alpha: &str) -> Result<u8> {
    let alpha = alpha.trim();
    if let Some(hex) = alpha.strip_prefix("0x").or_else(|| alpha.strip_prefix("0X")) {
        if !is_hex(hex) {
            return Err(Error::invalid_color(input, "bad hex alpha"));
        }
        return u8::from_str_radix(hex, 16).map_err(|_| Error::invalid_color(input, "bad hex alpha"));
    }
    let value: f64 = alpha
        .parse()
        .map_err(|_| Error::invalid_color(input, "alpha is not a number"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::invalid_color(input, "alpha outside [0, 1]"));
    }
    // truncates: 0.5 -> 127
    Ok((value * 255.0) as u8)
}

/// A Y, U, V, A quadruple in the order device kernels consume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct YuvaColor {
    /// Luma.
    pub y: u8,
    /// Blue-difference chroma.
    pub u: u8,
    /// Red-difference chroma.
    pub v: u8,
    /// Opacity; 255 = opaque.
    pub a: u8,
}

impl YuvaColor {
    /// Creates a color from components.
    pub const fn new(y: u8, u: u8, v: u8, a: u8) -> Self {
        Self { y, u, v, a }
    }

    /// Limited-range BT.601 conversion in 10-bit fixed point.
    pub fn from_rgba(c: Rgba8) -> Self {
        let (r, g, b) = (c.r as i32, c.g as i32, c.b as i32);

        let y = (fix(0.29900 * 219.0 / 255.0) * r
            + fix(0.58700 * 219.0 / 255.0) * g
            + fix(0.11400 * 219.0 / 255.0) * b
            + (ONE_HALF + (16 << SCALEBITS)))
            >> SCALEBITS;
        let u = ((-fix(0.16874 * 224.0 / 255.0) * r - fix(0.33126 * 224.0 / 255.0) * g
            + fix(0.50000 * 224.0 / 255.0) * b
            + ONE_HALF
            - 1)
            >> SCALEBITS)
            + 128;
        let v = ((fix(0.50000 * 224.0 / 255.0) * r
            - fix(0.41869 * 224.0 / 255.0) * g
            - fix(0.08131 * 224.0 / 255.0) * b
            + ONE_HALF
            - 1)
            >> SCALEBITS)
            + 128;

        Self {
            y: y.clamp(0, 255) as u8,
            u: u.clamp(0, 255) as u8,
            v: v.clamp(0, 255) as u8,
            a: c.a,
        }
    }

    /// Bytes in Y, U, V, A order.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.y, self.u, self.v, self.a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_hex_rejected() {
        assert!(Rgba8::parse("#+fffff").is_err());
        assert!(Rgba8::parse("0x+1234567").is_err());
        assert!(Rgba8::parse("white@0x+f").is_err());
        assert_eq!(Rgba8::parse("white@0x80").unwrap().a, 0x80);
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(Rgba8::parse("black").unwrap(), Rgba8::new(0, 0, 0, 255));
        assert_eq!(Rgba8::parse("White").unwrap(), Rgba8::new(255, 255, 255, 255));
        assert!(Rgba8::parse("notacolor").is_err());
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(Rgba8::parse("#ff8000").unwrap(), Rgba8::new(255, 128, 0, 255));
        assert_eq!(Rgba8::parse("0x10203040").unwrap(), Rgba8::new(0x10, 0x20, 0x30, 0x40));
        assert!(Rgba8::parse("#fff").is_err());
    }

    #[test]
    fn test_alpha_suffix() {
        assert_eq!(Rgba8::parse("blue@1").unwrap().a, 255);
        assert_eq!(Rgba8::parse("blue@0").unwrap().a, 0);
        assert_eq!(Rgba8::parse("blue@0.5").unwrap().a, 127);
        assert_eq!(Rgba8::parse("blue@0x80").unwrap().a, 0x80);
        assert!(Rgba8::parse("blue@1.5").is_err());
    }

    #[test]
    fn test_bt601_limited_range() {
        assert_eq!(YuvaColor::from_rgba(Rgba8::new(255, 255, 255, 255)), YuvaColor::new(235, 128, 128, 255));
        assert_eq!(YuvaColor::from_rgba(Rgba8::new(0, 0, 0, 255)), YuvaColor::new(16, 128, 128, 255));
        let red = YuvaColor::from_rgba(Rgba8::new(255, 0, 0, 255));
        assert_eq!(red.y, 81);
        assert!(red.v > 200);
        assert!(red.u < 128);
    }

    #[test]
    fn test_to_bytes_order() {
        assert_eq!(YuvaColor::new(1, 2, 3, 4).to_bytes(), [1, 2, 3, 4]);
    }
}
