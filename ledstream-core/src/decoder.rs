//! Incremental frame reassembly.
//!
//! Bytes arrive in whatever pieces the socket hands out. The decoder is
//! a two-state machine that accepts any slice, copies what the current
//! state needs and keeps going until the slice is exhausted:
//!
//! - `AwaitingHeader`: fill the fixed 10-byte header buffer, then
//!   validate it.
//! - `AwaitingPayload`: fill the payload buffer up to
//!   `pixel_count * bytes_per_pixel`, then hand the frame out.
//!
//! A header and part of a payload, or the tail of one frame and the
//! start of the next, may arrive in the same slice; both are handled in
//! one [`feed`](FrameDecoder::feed) call.

use tracing::trace;

use crate::error::LedStreamError;
use crate::header::{FrameHeader, FrameHeaderBytes, HEADER_SIZE};

/// Where the decoder currently is within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// `buffered` header bytes held, always below [`HEADER_SIZE`].
    AwaitingHeader { buffered: usize },
    /// Header validated; `buffered` of `header.payload_len()` payload
    /// bytes held.
    AwaitingPayload { header: FrameHeader, buffered: usize },
}

impl Default for DecoderState {
    fn default() -> Self {
        DecoderState::AwaitingHeader { buffered: 0 }
    }
}

/// Stream decoder for LEDS frames.
///
/// The payload buffer is owned here and reused across frames; completed
/// payloads are lent to the caller for the duration of the callback.
pub struct FrameDecoder {
    state: DecoderState,
    header_buf: FrameHeaderBytes,
    payload: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::default(),
            header_buf: [0u8; HEADER_SIZE],
            payload: Vec::new(),
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Bytes held for the frame currently being assembled.
    pub fn buffered(&self) -> usize {
        match self.state {
            DecoderState::AwaitingHeader { buffered } => buffered,
            DecoderState::AwaitingPayload { buffered, .. } => buffered,
        }
    }

    /// Drop any partial header or payload and wait for a new header.
    ///
    /// The payload allocation is kept for the next frame.
    pub fn reset(&mut self) {
        self.state = DecoderState::default();
        self.payload.clear();
    }

    /// Consume `input`, calling `on_frame` once for every frame completed
    /// along the way. Returns the number of frames completed.
    ///
    /// On a header validation failure the decoder resets, the rest of
    /// `input` is discarded and the error is returned. Frames completed
    /// earlier in the same slice have already been delivered.
    pub fn feed<F>(&mut self, mut input: &[u8], mut on_frame: F) -> Result<usize, LedStreamError>
    where
        F: FnMut(&FrameHeader, &[u8]),
    {
        let mut frames = 0;

        while !input.is_empty() {
            match self.state {
                DecoderState::AwaitingHeader { buffered } => {
                    let take = (HEADER_SIZE - buffered).min(input.len());
                    self.header_buf[buffered..buffered + take].copy_from_slice(&input[..take]);
                    input = &input[take..];

                    let buffered = buffered + take;
                    if buffered < HEADER_SIZE {
                        self.state = DecoderState::AwaitingHeader { buffered };
                        continue;
                    }

                    let header = match FrameHeader::decode(&self.header_buf) {
                        Ok(h) => h,
                        Err(e) => {
                            self.reset();
                            return Err(e);
                        }
                    };
                    trace!(
                        pixels = header.pixel_count(),
                        format = %header.format(),
                        "frame header accepted"
                    );

                    self.payload.clear();
                    self.payload.reserve(header.payload_len());
                    self.state = DecoderState::AwaitingPayload {
                        header,
                        buffered: 0,
                    };
                }

                DecoderState::AwaitingPayload { header, buffered } => {
                    let expected = header.payload_len();
                    let take = (expected - buffered).min(input.len());
                    self.payload.extend_from_slice(&input[..take]);
                    input = &input[take..];

                    let buffered = buffered + take;
                    if buffered < expected {
                        self.state = DecoderState::AwaitingPayload { header, buffered };
                        continue;
                    }

                    on_frame(&header, &self.payload);
                    frames += 1;
                    self.state = DecoderState::default();
                }
            }
        }

        Ok(frames)
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PixelFormat;

    fn frame_bytes(count: u32, format: PixelFormat, seed: u8) -> (FrameHeader, Vec<u8>, Vec<u8>) {
        let header = FrameHeader::new(count, format).unwrap();
        let payload: Vec<u8> = (0..header.payload_len())
            .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
            .collect();
        let mut wire = header.encode().to_vec();
        wire.extend_from_slice(&payload);
        (header, payload, wire)
    }

    fn collect(decoder: &mut FrameDecoder, chunks: &[&[u8]]) -> Vec<(FrameHeader, Vec<u8>)> {
        let mut out = Vec::new();
        for chunk in chunks {
            decoder
                .feed(chunk, |h, p| out.push((*h, p.to_vec())))
                .unwrap();
        }
        out
    }

    #[test]
    fn single_read() {
        let (header, payload, wire) = frame_bytes(7, PixelFormat::Rgb, 1);
        let mut dec = FrameDecoder::new();
        let frames = collect(&mut dec, &[&wire]);
        assert_eq!(frames, vec![(header, payload)]);
        assert_eq!(dec.state(), DecoderState::AwaitingHeader { buffered: 0 });
    }

    #[test]
    fn reassembly_is_fragmentation_invariant() {
        let (header, payload, wire) = frame_bytes(13, PixelFormat::Grbw, 7);

        for chunk_size in [1, 2, 3, 9, 10, 11, 17, wire.len() - 1] {
            let chunks: Vec<&[u8]> = wire.chunks(chunk_size).collect();
            let mut dec = FrameDecoder::new();
            let frames = collect(&mut dec, &chunks);
            assert_eq!(frames.len(), 1, "chunk size {chunk_size}");
            assert_eq!(frames[0].0, header);
            assert_eq!(frames[0].1, payload);
        }

        // Uneven split straddling the header boundary.
        let mut dec = FrameDecoder::new();
        let frames = collect(&mut dec, &[&wire[..4], &wire[4..12], &wire[12..13], &wire[13..]]);
        assert_eq!(frames, vec![(header, payload)]);
    }

    #[test]
    fn pipelined_frames_in_one_read() {
        let (h1, p1, w1) = frame_bytes(2, PixelFormat::Rgb, 1);
        let (h2, p2, w2) = frame_bytes(3, PixelFormat::Bgr, 2);
        let (_, _, w3) = frame_bytes(4, PixelFormat::Rgbw, 3);

        let mut wire = w1.clone();
        wire.extend_from_slice(&w2);
        wire.extend_from_slice(&w3[..5]);

        let mut dec = FrameDecoder::new();
        let frames = collect(&mut dec, &[&wire]);
        assert_eq!(frames, vec![(h1, p1), (h2, p2)]);
        assert_eq!(dec.state(), DecoderState::AwaitingHeader { buffered: 5 });
    }

    #[test]
    fn partial_states_are_reported() {
        let (header, _, wire) = frame_bytes(2, PixelFormat::Rgb, 0);
        let mut dec = FrameDecoder::new();

        dec.feed(&wire[..6], |_, _| panic!("no frame yet")).unwrap();
        assert_eq!(dec.state(), DecoderState::AwaitingHeader { buffered: 6 });

        dec.feed(&wire[6..12], |_, _| panic!("no frame yet")).unwrap();
        assert_eq!(
            dec.state(),
            DecoderState::AwaitingPayload {
                header,
                buffered: 2
            }
        );
        assert_eq!(dec.buffered(), 2);
    }

    #[test]
    fn invalid_pixel_count_is_a_violation_and_resets() {
        for count in [0u32, 5001] {
            let mut wire = Vec::from(*b"LEDS");
            wire.push(1);
            wire.extend_from_slice(&count.to_be_bytes());
            wire.push(0);
            wire.extend_from_slice(&[0xAA; 64]);

            let mut dec = FrameDecoder::new();
            let err = dec.feed(&wire, |_, _| panic!("must not decode")).unwrap_err();
            assert!(matches!(err, LedStreamError::InvalidPixelCount { .. }));
            assert_eq!(dec.state(), DecoderState::AwaitingHeader { buffered: 0 });
        }
    }

    #[test]
    fn violation_after_a_good_frame_still_delivers_the_good_frame() {
        let (h1, p1, mut wire) = frame_bytes(1, PixelFormat::Rgb, 0);
        wire.extend_from_slice(b"NOPE\x01\x00\x00\x00\x01\x00");

        let mut dec = FrameDecoder::new();
        let mut frames = Vec::new();
        let err = dec
            .feed(&wire, |h, p| frames.push((*h, p.to_vec())))
            .unwrap_err();
        assert!(matches!(err, LedStreamError::InvalidMagic(_)));
        assert_eq!(frames, vec![(h1, p1)]);
    }

    #[test]
    fn reset_discards_partial_payload() {
        let (header, payload, wire) = frame_bytes(5, PixelFormat::Rgb, 4);
        let mut dec = FrameDecoder::new();
        dec.feed(&wire[..HEADER_SIZE + 3], |_, _| {}).unwrap();
        assert_eq!(dec.buffered(), 3);

        dec.reset();
        assert_eq!(dec.state(), DecoderState::AwaitingHeader { buffered: 0 });

        // Fresh frame decodes cleanly, nothing from before leaks in.
        let frames = collect(&mut dec, &[&wire]);
        assert_eq!(frames, vec![(header, payload)]);
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let mut dec = FrameDecoder::new();
        assert_eq!(dec.feed(&[], |_, _| {}).unwrap(), 0);
        assert_eq!(dec.state(), DecoderState::default());
    }
}
