//! Domain-specific error types for the LEDS stream protocol.
//!
//! All fallible operations return `Result<T, LedStreamError>`.
//! No panics on invalid input: every error is typed and recoverable.

use std::fmt;

use thiserror::Error;

/// The canonical error type for the LED stream receiver.
#[derive(Debug, Error)]
pub enum LedStreamError {
    // ── Protocol Errors ──────────────────────────────────────────
    /// The first four header bytes were not `LEDS`.
    #[error("bad magic: got {0:02X?}, expected 'LEDS'")]
    InvalidMagic([u8; 4]),

    /// The protocol version offered by the peer is not supported.
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u8),

    /// The header declared a pixel count outside `1..=MAX_PIXELS`.
    #[error("invalid pixel count {count} (expected 1..={max})")]
    InvalidPixelCount { count: u32, max: u32 },

    /// A numeric value did not map to any known enum variant.
    #[error("unknown {type_name} discriminant: {value:#x}")]
    UnknownVariant { type_name: &'static str, value: u64 },

    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The listening socket could not be set up.
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    // ── Configuration Errors ─────────────────────────────────────
    /// A configuration value is missing or out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl LedStreamError {
    /// Returns `true` for errors raised by header validation. These
    /// always end the connection that produced them.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic(_)
                | Self::UnsupportedVersion(_)
                | Self::InvalidPixelCount { .. }
                | Self::UnknownVariant { .. }
        )
    }
}

// ── DisconnectReason ─────────────────────────────────────────────

/// Why the controller dropped a client.
///
/// Every reason is handled identically (close, count, reset); the
/// distinction only shows up in logs and tick reports.
#[derive(Debug)]
pub enum DisconnectReason {
    /// The header failed validation.
    Protocol(LedStreamError),
    /// A read returned zero bytes.
    PeerClosed,
    /// No bytes arrived within the inactivity timeout.
    Timeout,
    /// The transport reported an I/O error.
    Io(std::io::Error),
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => write!(f, "protocol violation: {e}"),
            Self::PeerClosed => write!(f, "peer closed connection"),
            Self::Timeout => write!(f, "connection timeout"),
            Self::Io(e) => write!(f, "transport error: {e}"),
        }
    }
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for LedStreamError {
    fn from(s: String) -> Self {
        LedStreamError::Other(s)
    }
}

impl From<&str> for LedStreamError {
    fn from(s: &str) -> Self {
        LedStreamError::Other(s.to_string())
    }
}
