//! # ledstream-core
//!
//! Receiver side of the LEDS streaming protocol: a TCP client pushes
//! raw pixel frames and the receiver spreads them across one or more
//! addressable LED strips.
//!
//! This crate contains:
//! - **Wire format**: `FrameHeader`, `PixelFormat`, `Color`
//! - **Decoder**: `FrameDecoder`, a push-based reassembler tolerant of arbitrary fragmentation
//! - **Strips**: the `OutputStrip` seam and `FrameApplier` for multi-strip distribution
//! - **Timing**: `CompletionMode` and `OverlapTracker` for render-window bookkeeping
//! - **Stats**: wrapping counters, `MetricsAggregator` and the `MetricsSink` seam
//! - **Controller**: `LedStreamController`, the tick-driven single-client loop
//! - **Transport**: non-blocking `Listener`/`ClientStream` seams and their TCP implementation
//! - **Codec**: `LedsCodec` for framed async clients via `tokio_util`
//! - **Error**: `LedStreamError`, a `thiserror`-based error type

pub mod ack;
pub mod codec;
pub mod controller;
pub mod decoder;
pub mod error;
pub mod format;
pub mod header;
pub mod network;
pub mod state;
pub mod stats;
pub mod strip;
pub mod timing;
pub mod transport;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use ack::{ACK_BYTE, AckPolicy};
pub use codec::{Frame, LedsCodec};
pub use controller::{ControllerConfig, LedStreamController, TickReport};
pub use decoder::{DecoderState, FrameDecoder};
pub use error::{DisconnectReason, LedStreamError};
pub use format::{Color, PixelFormat};
pub use header::{FrameHeader, HEADER_SIZE, MAGIC, MAX_PIXELS, PROTOCOL_VERSION};
pub use network::{TcpClient, TcpTransport};
pub use state::ConnectionPhase;
pub use stats::{MetricsAggregator, MetricsSink, MetricsSnapshot, StreamCounters};
pub use strip::{FrameApplier, MemoryStrip, OutputStrip};
pub use timing::{CompletionMode, OverlapTracker};
pub use transport::{Clock, ClientStream, Listener, MonotonicClock, ReadOutcome, WriteOutcome};
