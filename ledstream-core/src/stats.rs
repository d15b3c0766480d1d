//! Stream counters and their periodic publication.
//!
//! Counters are plain owned state updated by the controller. The
//! [`MetricsAggregator`] samples them on a fixed cadence, derives the
//! frame rate from the delta since its previous sample and pushes the
//! values to a [`MetricsSink`]. Sampling never resets a counter.

use serde::Serialize;

/// Metric names as published to a sink.
pub mod names {
    pub const FRAME_RATE: &str = "frame_rate";
    pub const BYTES_RECEIVED: &str = "bytes_received";
    pub const CONNECTS: &str = "connects";
    pub const DISCONNECTS: &str = "disconnects";
    pub const OVERLAPS: &str = "overlaps";
    pub const CLIENT_CONNECTED: &str = "client_connected";
}

// ── StreamCounters ───────────────────────────────────────────────

/// Monotonic counters. Each wraps on overflow instead of saturating.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StreamCounters {
    pub frames: u64,
    pub bytes_received: u64,
    pub connects: u64,
    pub disconnects: u64,
    pub overlaps: u64,
}

impl StreamCounters {
    pub fn add_frame(&mut self) {
        self.frames = self.frames.wrapping_add(1);
    }

    pub fn add_bytes(&mut self, n: usize) {
        self.bytes_received = self.bytes_received.wrapping_add(n as u64);
    }

    pub fn add_connect(&mut self) {
        self.connects = self.connects.wrapping_add(1);
    }

    pub fn add_disconnect(&mut self) {
        self.disconnects = self.disconnects.wrapping_add(1);
    }

    pub fn add_overlap(&mut self) {
        self.overlaps = self.overlaps.wrapping_add(1);
    }
}

// ── MetricsSink ──────────────────────────────────────────────────

/// Destination for published metrics.
pub trait MetricsSink {
    /// Publish a numeric value.
    fn publish(&mut self, name: &str, value: f64);

    /// Publish a boolean state. Sinks without binary outputs may ignore it.
    fn publish_state(&mut self, _name: &str, _value: bool) {}
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn publish(&mut self, name: &str, value: f64) {
        (**self).publish(name, value)
    }

    fn publish_state(&mut self, name: &str, value: bool) {
        (**self).publish_state(name, value)
    }
}

// ── MetricsSnapshot ──────────────────────────────────────────────

/// One published sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Frames per second since the previous sample.
    pub frame_rate: f64,
    pub frames: u64,
    pub bytes_received: u64,
    pub connects: u64,
    pub disconnects: u64,
    pub overlaps: u64,
}

impl MetricsSnapshot {
    /// Push every value in this sample to `sink`.
    pub fn publish_to<K: MetricsSink + ?Sized>(&self, sink: &mut K) {
        sink.publish(names::FRAME_RATE, self.frame_rate);
        sink.publish(names::BYTES_RECEIVED, self.bytes_received as f64);
        sink.publish(names::CONNECTS, self.connects as f64);
        sink.publish(names::DISCONNECTS, self.disconnects as f64);
        sink.publish(names::OVERLAPS, self.overlaps as f64);
    }
}

// ── MetricsAggregator ────────────────────────────────────────────

/// Samples [`StreamCounters`] every `interval_ms`.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    interval_ms: u64,
    last_sample_ms: u64,
    last_frames: u64,
}

impl MetricsAggregator {
    pub const DEFAULT_INTERVAL_MS: u64 = 1000;

    /// Start sampling with the first interval beginning at `now_ms`.
    pub fn new(interval_ms: u64, now_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            last_sample_ms: now_ms,
            last_frames: 0,
        }
    }

    /// Take a sample if a full interval has elapsed since the previous one.
    pub fn sample(&mut self, now_ms: u64, counters: &StreamCounters) -> Option<MetricsSnapshot> {
        let elapsed_ms = now_ms.saturating_sub(self.last_sample_ms);
        if elapsed_ms < self.interval_ms {
            return None;
        }

        let seconds = elapsed_ms as f64 / 1000.0;
        let delta = counters.frames.wrapping_sub(self.last_frames);
        self.last_sample_ms = now_ms;
        self.last_frames = counters.frames;

        Some(MetricsSnapshot {
            frame_rate: delta as f64 / seconds,
            frames: counters.frames,
            bytes_received: counters.bytes_received,
            connects: counters.connects,
            disconnects: counters.disconnects,
            overlaps: counters.overlaps,
        })
    }
}

// ── Tests ────────────────────────────────────────────────────────
