//! Host-side collaborators: strips that render into memory and trace
//! their frames, and a metrics sink that writes to the log.

use tracing::{debug, info, trace};

use ledstream_core::{Color, MemoryStrip, MetricsSink, OutputStrip};

use crate::config::StripConfig;

// ── LoggingStrip ─────────────────────────────────────────────────

/// A named in-memory strip that traces every render request.
#[derive(Debug, Clone)]
pub struct LoggingStrip {
    name: String,
    inner: MemoryStrip,
}

impl LoggingStrip {
    pub fn new(name: impl Into<String>, leds: usize) -> Self {
        Self {
            name: name.into(),
            inner: MemoryStrip::new(leds),
        }
    }

    pub fn from_config(configs: &[StripConfig]) -> Vec<Self> {
        configs.iter().map(|c| Self::new(&c.name, c.leds)).collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pixels(&self) -> &[Color] {
        self.inner.pixels()
    }

    pub fn render_count(&self) -> u64 {
        self.inner.render_count()
    }
}

impl OutputStrip for LoggingStrip {
    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn set_pixel(&mut self, index: usize, color: Color) {
        self.inner.set_pixel(index, color);
    }

    fn request_render(&mut self) {
        self.inner.request_render();
        trace!(
            strip = %self.name,
            render = self.inner.render_count(),
            first = ?self.inner.pixels().first(),
            "render"
        );
    }
}

// ── TracingSink ──────────────────────────────────────────────────

/// Publishes metric values and state changes as log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn publish(&mut self, name: &str, value: f64) {
        debug!(metric = name, value, "metric");
    }

    fn publish_state(&mut self, name: &str, value: bool) {
        info!(state = name, value, "state changed");
    }
}
