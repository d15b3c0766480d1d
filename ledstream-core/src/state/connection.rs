//! Client connection lifecycle.
//!
//! Provides a `ConnectionPhase` enum for the single-client receiver,
//! with validated transitions that return `Result` instead of panicking.

use crate::error::LedStreamError;

// ── ConnectionPhase ──────────────────────────────────────────────

/// The current phase of the receiver's one client slot.
///
/// ```text
///   NoClient ──accept──► ClientConnected
///      ▲                       │
///      └───────close───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionPhase {
    /// Waiting for a client. Initial state.
    #[default]
    NoClient,

    /// A client is attached and being decoded.
    ClientConnected {
        /// When the client was accepted (ms).
        connected_at: u64,
        /// Last time bytes or a frame arrived (ms).
        last_activity: u64,
    },
}

impl std::fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoClient => write!(f, "NoClient"),
            Self::ClientConnected { .. } => write!(f, "ClientConnected"),
        }
    }
}

impl ConnectionPhase {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::ClientConnected { .. })
    }

    /// Milliseconds since the last activity, `None` without a client.
    pub fn idle_ms(&self, now_ms: u64) -> Option<u64> {
        match self {
            Self::ClientConnected { last_activity, .. } => {
                Some(now_ms.saturating_sub(*last_activity))
            }
            Self::NoClient => None,
        }
    }

    /// How long the current client has been attached.
    pub fn connected_ms(&self, now_ms: u64) -> Option<u64> {
        match self {
            Self::ClientConnected { connected_at, .. } => {
                Some(now_ms.saturating_sub(*connected_at))
            }
            Self::NoClient => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `ClientConnected`.
    ///
    /// Valid from: `NoClient`.
    pub fn accept(&mut self, now_ms: u64) -> Result<(), LedStreamError> {
        match self {
            Self::NoClient => {
                *self = Self::ClientConnected {
                    connected_at: now_ms,
                    last_activity: now_ms,
                };
                Ok(())
            }
            Self::ClientConnected { .. } => {
                Err("cannot accept: a client is already connected".into())
            }
        }
    }

    /// Record activity on the current client. No-op without one.
    pub fn touch(&mut self, now_ms: u64) {
        if let Self::ClientConnected { last_activity, .. } = self {
            *last_activity = now_ms;
        }
    }

    /// Transition to `NoClient`.
    ///
    /// Valid from: `ClientConnected`.
    pub fn close(&mut self) -> Result<(), LedStreamError> {
        match self {
            Self::ClientConnected { .. } => {
                *self = Self::NoClient;
                Ok(())
            }
            Self::NoClient => Err("cannot close: no client connected".into()),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_lifecycle() {
        let mut phase = ConnectionPhase::NoClient;

        phase.accept(100).unwrap();
        assert!(phase.is_connected());
        assert_eq!(phase.idle_ms(150), Some(50));

        phase.touch(140);
        assert_eq!(phase.idle_ms(150), Some(10));
        assert_eq!(phase.connected_ms(150), Some(50));

        phase.close().unwrap();
        assert_eq!(phase, ConnectionPhase::NoClient);
        assert_eq!(phase.idle_ms(150), None);
    }

    #[test]
    fn accept_while_connected_is_rejected() {
        let mut phase = ConnectionPhase::NoClient;
        phase.accept(0).unwrap();
        assert!(phase.accept(1).is_err());
    }

    #[test]
    fn close_without_client_is_rejected() {
        let mut phase = ConnectionPhase::default();
        assert!(phase.close().is_err());
    }

    #[test]
    fn touch_without_client_is_ignored() {
        let mut phase = ConnectionPhase::NoClient;
        phase.touch(5);
        assert_eq!(phase, ConnectionPhase::NoClient);
    }

    #[test]
    fn display_format() {
        assert_eq!(ConnectionPhase::NoClient.to_string(), "NoClient");
        assert_eq!(
            ConnectionPhase::ClientConnected {
                connected_at: 0,
                last_activity: 0
            }
            .to_string(),
            "ClientConnected"
        );
    }
}
