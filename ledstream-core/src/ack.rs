//! Best-effort acknowledgment byte.
//!
//! When enabled, the receiver writes a single [`ACK_BYTE`] back to the
//! client once the strips are presumed done rendering the latest frame.
//! A client may use it to pace itself. Nothing is retransmitted and a
//! failed write never affects the connection.

/// ASCII ACK.
pub const ACK_BYTE: u8 = 0x06;

/// Whether and when to acknowledge frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckPolicy {
    #[default]
    Disabled,
    /// Acknowledge `margin_ms` after the completion window of the most
    /// recent frame has elapsed.
    AfterRender { margin_ms: u32 },
}

/// Tracks the single pending acknowledgment.
#[derive(Debug, Clone, Default)]
pub struct AckScheduler {
    policy: AckPolicy,
    due_ms: Option<u64>,
}

impl AckScheduler {
    pub fn new(policy: AckPolicy) -> Self {
        Self {
            policy,
            due_ms: None,
        }
    }

    /// A frame completed at `now_ms`. Replaces any pending ACK, so a
    /// burst of frames yields one ACK after the last of them.
    pub fn schedule(&mut self, now_ms: u64, window_ms: u64) {
        if let AckPolicy::AfterRender { margin_ms } = self.policy {
            self.due_ms = Some(now_ms + window_ms + margin_ms as u64);
        }
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.due_ms.is_some_and(|due| now_ms >= due)
    }

    pub fn pending(&self) -> bool {
        self.due_ms.is_some()
    }

    pub fn cancel(&mut self) {
        self.due_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_never_schedules() {
        let mut ack = AckScheduler::new(AckPolicy::Disabled);
        ack.schedule(0, 10);
        assert!(!ack.pending());
        assert!(!ack.is_due(u64::MAX));
    }

    #[test]
    fn due_after_window_and_margin() {
        let mut ack = AckScheduler::new(AckPolicy::AfterRender { margin_ms: 2 });
        ack.schedule(100, 15);
        assert!(ack.pending());
        assert!(!ack.is_due(116));
        assert!(ack.is_due(117));
    }

    #[test]
    fn later_frame_reschedules() {
        let mut ack = AckScheduler::new(AckPolicy::AfterRender { margin_ms: 0 });
        ack.schedule(100, 10);
        ack.schedule(105, 10);
        assert!(!ack.is_due(110));
        assert!(ack.is_due(115));
        ack.cancel();
        assert!(!ack.pending());
    }
}
