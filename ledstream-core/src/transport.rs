//! Non-blocking transport seams used by the controller.
//!
//! Every call returns immediately: a read either yields bytes, reports
//! that the peer closed, or reports that nothing is available yet.

use std::time::Instant;

use crate::error::LedStreamError;

/// Result of one non-blocking read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n > 0` bytes were written to the front of the buffer.
    Data(usize),
    /// Zero-byte read: the peer closed its side.
    Closed,
    /// Nothing available right now.
    WouldBlock,
}

/// Result of one non-blocking write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(usize),
    WouldBlock,
}

/// One accepted client connection.
pub trait ClientStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome, LedStreamError>;

    fn write(&mut self, buf: &[u8]) -> Result<WriteOutcome, LedStreamError>;

    /// Close the connection. Further calls are not made.
    fn close(&mut self);

    /// Human-readable peer address, if known.
    fn peer(&self) -> Option<String> {
        None
    }
}

/// Accepts clients without blocking.
pub trait Listener {
    type Stream: ClientStream;

    /// Returns `Ok(None)` when no client is waiting.
    fn accept(&mut self) -> Result<Option<Self::Stream>, LedStreamError>;
}

// ── Clock ────────────────────────────────────────────────────────

/// Monotonic millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// [`Clock`] backed by [`Instant`], counting from construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

// ── Scripted transport (tests) ───────────────────────────────────
