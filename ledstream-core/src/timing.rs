//! Frame completion window and overlap detection.
//!
//! A strip needs some time to physically shift a frame out. Until that
//! window has elapsed the last frame is presumed in progress; a new
//! frame completing inside the window is an *overlap*, meaning the
//! client is pushing faster than the strips can render. Overlaps are
//! counted, never treated as errors.

/// How the completion window is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// A fixed window in milliseconds.
    Heuristic { window_ms: u32 },
    /// `max(1, total_leds * per_led_us / 1000 + margin_ms)`.
    Estimate { per_led_us: u32, margin_ms: u32 },
}

impl Default for CompletionMode {
    fn default() -> Self {
        CompletionMode::Heuristic { window_ms: 15 }
    }
}

impl CompletionMode {
    /// Completion window in milliseconds for `total_leds` pixels.
    pub fn window_ms(&self, total_leds: usize) -> u64 {
        match *self {
            CompletionMode::Heuristic { window_ms } => window_ms as u64,
            CompletionMode::Estimate {
                per_led_us,
                margin_ms,
            } => {
                let shift_ms = total_leds as u64 * per_led_us as u64 / 1000;
                (shift_ms + margin_ms as u64).max(1)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CompletionMode::Heuristic { .. } => "heuristic",
            CompletionMode::Estimate { .. } => "estimate",
        }
    }
}

/// Tracks whether the most recent frame is presumed still rendering.
#[derive(Debug, Default, Clone)]
pub struct OverlapTracker {
    in_progress: bool,
    last_frame_ms: u64,
}

impl OverlapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed frame at `now_ms`.
    ///
    /// Returns `true` when the previous frame was still flagged and
    /// completed less than `window_ms` ago. The new frame is flagged
    /// either way.
    pub fn record_frame(&mut self, now_ms: u64, window_ms: u64) -> bool {
        let overlap =
            self.in_progress && now_ms.saturating_sub(self.last_frame_ms) < window_ms;
        self.in_progress = true;
        self.last_frame_ms = now_ms;
        overlap
    }

    /// Clear the flag once `window_ms` has elapsed since the flagged
    /// frame. Call on every tick, with or without traffic.
    pub fn expire(&mut self, now_ms: u64, window_ms: u64) {
        if self.in_progress && now_ms.saturating_sub(self.last_frame_ms) >= window_ms {
            self.in_progress = false;
        }
    }

    /// Drop the flag unconditionally (connection closed).
    pub fn clear(&mut self) {
        self.in_progress = false;
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    /// Completion time of the most recent frame.
    pub fn last_frame_ms(&self) -> u64 {
        self.last_frame_ms
    }
}

// ── Tests ────────────────────────────────────────────────────────
