//! `tokio_util` encoder for whole LEDS frames.
//!
//! Senders push [`Frame`]s through a `FramedWrite`; the receiver side
//! decodes with the push-based [`FrameDecoder`].
//!
//! [`FrameDecoder`]: crate::decoder::FrameDecoder

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::Encoder;

use crate::error::LedStreamError;
use crate::format::{Color, PixelFormat};
use crate::header::{FrameHeader, HEADER_SIZE};

/// A header together with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: FrameHeader,
    payload: Bytes,
}

impl Frame {
    /// Encode `colors` in `format`.
    pub fn from_colors(format: PixelFormat, colors: &[Color]) -> Result<Self, LedStreamError> {
        let header = FrameHeader::new(colors.len() as u32, format)?;
        let mut payload = Vec::with_capacity(header.payload_len());
        for &color in colors {
            format.encode_pixel(color, &mut payload);
        }
        Ok(Self {
            header,
            payload: Bytes::from(payload),
        })
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Bytes this frame occupies on the wire.
    pub fn wire_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encodes [`Frame`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct LedsCodec;

impl Encoder<Frame> for LedsCodec {
    type Error = LedStreamError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.wire_len());
        dst.put_slice(&item.header.encode());
        dst.put_slice(&item.payload);
        Ok(())
    }
}
