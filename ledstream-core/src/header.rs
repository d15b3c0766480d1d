//! Fixed 10-byte frame header.
//!
//! ```text
//! offset  size  field
//! 0       4     magic "LEDS"
//! 4       1     version (0x01)
//! 5       4     pixel count, u32 big-endian, 1..=5000
//! 9       1     pixel format tag
//! ```

use crate::error::LedStreamError;
use crate::format::PixelFormat;

/// Magic literal opening every frame.
pub const MAGIC: [u8; 4] = *b"LEDS";

/// The only protocol version this receiver accepts.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Upper bound on the pixel count a single frame may declare.
pub const MAX_PIXELS: u32 = 5000;

/// Encoded header length in bytes.
pub const HEADER_SIZE: usize = 10;

pub type FrameHeaderBytes = [u8; HEADER_SIZE];

/// A fully validated frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pixel_count: u32,
    format: PixelFormat,
}

impl FrameHeader {
    /// Build a header for `pixel_count` pixels in `format`.
    pub fn new(pixel_count: u32, format: PixelFormat) -> Result<Self, LedStreamError> {
        check_pixel_count(pixel_count)?;
        Ok(Self {
            pixel_count,
            format,
        })
    }

    /// Validate raw header bytes.
    ///
    /// Checks run in wire order and stop at the first failure: magic,
    /// version, pixel count, format tag.
    pub fn decode(bytes: &FrameHeaderBytes) -> Result<Self, LedStreamError> {
        let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if magic != MAGIC {
            return Err(LedStreamError::InvalidMagic(magic));
        }
        if bytes[4] != PROTOCOL_VERSION {
            return Err(LedStreamError::UnsupportedVersion(bytes[4]));
        }
        let pixel_count = u32::from_be_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]);
        check_pixel_count(pixel_count)?;
        let format = PixelFormat::try_from(bytes[9])?;
        Ok(Self {
            pixel_count,
            format,
        })
    }

    /// Serialize to wire bytes.
    pub fn encode(&self) -> FrameHeaderBytes {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4] = PROTOCOL_VERSION;
        buf[5..9].copy_from_slice(&self.pixel_count.to_be_bytes());
        buf[9] = self.format.tag();
        buf
    }

    pub fn pixel_count(&self) -> u32 {
        self.pixel_count
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Exact payload length that follows this header.
    pub fn payload_len(&self) -> usize {
        self.pixel_count as usize * self.format.bytes_per_pixel()
    }
}

fn check_pixel_count(count: u32) -> Result<(), LedStreamError> {
    if count == 0 || count > MAX_PIXELS {
        return Err(LedStreamError::InvalidPixelCount {
            count,
            max: MAX_PIXELS,
        });
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────
