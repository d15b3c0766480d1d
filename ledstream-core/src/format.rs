//! Pixel formats carried in the frame header and the per-pixel color
//! conversion applied to payload bytes.

use std::fmt;

use crate::error::LedStreamError;

// ── Color ────────────────────────────────────────────────────────

/// A four-channel LED color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub w: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, w: u8) -> Self {
        Self { r, g, b, w }
    }

    /// Build a color from three channels, deriving white as the floored
    /// integer mean of red, green and blue.
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let w = ((r as u16 + g as u16 + b as u16) / 3) as u8;
        Self { r, g, b, w }
    }
}

// ── PixelFormat ──────────────────────────────────────────────────

/// Byte layout of one pixel in a frame payload.
///
/// | Tag | Variant | Bytes           |
/// |-----|---------|-----------------|
/// | 0   | `Rgb`   | `r g b`         |
/// | 1   | `Rgbw`  | `r g b w`       |
/// | 2   | `Grb`   | `g r b`         |
/// | 3   | `Grbw`  | `g r b w`       |
/// | 4   | `Bgr`   | `b g r`         |
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgb = 0,
    Rgbw = 1,
    Grb = 2,
    Grbw = 3,
    Bgr = 4,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 5] = [
        PixelFormat::Rgb,
        PixelFormat::Rgbw,
        PixelFormat::Grb,
        PixelFormat::Grbw,
        PixelFormat::Bgr,
    ];

    /// Bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgbw | PixelFormat::Grbw => 4,
            PixelFormat::Rgb | PixelFormat::Grb | PixelFormat::Bgr => 3,
        }
    }

    /// Wire tag for this format.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Decode one pixel from `px`, which must hold at least
    /// [`bytes_per_pixel`](Self::bytes_per_pixel) bytes.
    ///
    /// # Panics
    ///
    /// Panics if `px` is shorter than one pixel.
    pub fn decode_pixel(self, px: &[u8]) -> Color {
        match self {
            PixelFormat::Rgb => Color::from_rgb(px[0], px[1], px[2]),
            PixelFormat::Grb => Color::from_rgb(px[1], px[0], px[2]),
            PixelFormat::Bgr => Color::from_rgb(px[2], px[1], px[0]),
            PixelFormat::Rgbw => Color::new(px[0], px[1], px[2], px[3]),
            PixelFormat::Grbw => Color::new(px[1], px[0], px[2], px[3]),
        }
    }

    /// Append the wire bytes for `color` to `out`. Three-byte formats
    /// drop the white channel.
    pub fn encode_pixel(self, color: Color, out: &mut Vec<u8>) {
        let Color { r, g, b, w } = color;
        match self {
            PixelFormat::Rgb => out.extend_from_slice(&[r, g, b]),
            PixelFormat::Grb => out.extend_from_slice(&[g, r, b]),
            PixelFormat::Bgr => out.extend_from_slice(&[b, g, r]),
            PixelFormat::Rgbw => out.extend_from_slice(&[r, g, b, w]),
            PixelFormat::Grbw => out.extend_from_slice(&[g, r, b, w]),
        }
    }
}

impl TryFrom<u8> for PixelFormat {
    type Error = LedStreamError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PixelFormat::Rgb),
            1 => Ok(PixelFormat::Rgbw),
            2 => Ok(PixelFormat::Grb),
            3 => Ok(PixelFormat::Grbw),
            4 => Ok(PixelFormat::Bgr),
            _ => Err(LedStreamError::UnknownVariant {
                type_name: "PixelFormat",
                value: value as u64,
            }),
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Rgb => "RGB",
            PixelFormat::Rgbw => "RGBW",
            PixelFormat::Grb => "GRB",
            PixelFormat::Grbw => "GRBW",
            PixelFormat::Bgr => "BGR",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for PixelFormat {
    type Err = LedStreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PixelFormat::ALL
            .into_iter()
            .find(|fmt| fmt.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| LedStreamError::Other(format!("unknown pixel format '{s}'")))
    }
}

// ── Tests ────────────────────────────────────────────────────────
