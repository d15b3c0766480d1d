//! Output strips and frame distribution.
//!
//! A frame carries one flat pixel array. The [`FrameApplier`] walks the
//! configured strips in order and hands each one the next slice of
//! pixels that fits its capacity, then asks every strip to render.

use tracing::trace;

use crate::format::{Color, PixelFormat};

// ── OutputStrip ──────────────────────────────────────────────────

/// An addressable LED output with a fixed number of pixels.
pub trait OutputStrip {
    /// Number of pixels the strip can show.
    fn capacity(&self) -> usize;

    /// Set pixel `index` (`< capacity()`) for the next render.
    fn set_pixel(&mut self, index: usize, color: Color);

    /// Schedule a render of the current pixel contents. Must not block.
    fn request_render(&mut self);
}

impl<S: OutputStrip + ?Sized> OutputStrip for Box<S> {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn set_pixel(&mut self, index: usize, color: Color) {
        (**self).set_pixel(index, color)
    }

    fn request_render(&mut self) {
        (**self).request_render()
    }
}

// ── MemoryStrip ──────────────────────────────────────────────────

/// A strip backed by a plain pixel buffer.
///
/// Counts render requests so callers can observe frame cadence.
#[derive(Debug, Clone)]
pub struct MemoryStrip {
    pixels: Vec<Color>,
    renders: u64,
}

impl MemoryStrip {
    pub fn new(capacity: usize) -> Self {
        Self {
            pixels: vec![Color::BLACK; capacity],
            renders: 0,
        }
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Number of render requests received so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }
}

impl OutputStrip for MemoryStrip {
    fn capacity(&self) -> usize {
        self.pixels.len()
    }

    fn set_pixel(&mut self, index: usize, color: Color) {
        if let Some(px) = self.pixels.get_mut(index) {
            *px = color;
        }
    }

    fn request_render(&mut self) {
        self.renders = self.renders.wrapping_add(1);
    }
}

// ── FrameApplier ─────────────────────────────────────────────────

/// Distributes decoded payloads across an ordered, fixed list of strips.
pub struct FrameApplier<S: OutputStrip> {
    strips: Vec<S>,
    total_leds: usize,
}

impl<S: OutputStrip> FrameApplier<S> {
    /// Take ownership of the strip list. The list and each strip's
    /// capacity are fixed from here on.
    pub fn new(strips: Vec<S>) -> Self {
        let total_leds = strips.iter().map(|s| s.capacity()).sum();
        Self { strips, total_leds }
    }

    /// Sum of all strip capacities.
    pub fn total_leds(&self) -> usize {
        self.total_leds
    }

    pub fn strips(&self) -> &[S] {
        &self.strips
    }

    /// Write `count` pixels from `payload` across the strips, then
    /// request a render on every strip, including those that received
    /// no pixels.
    ///
    /// Pixels beyond the total capacity, and capacity beyond `count`,
    /// are left alone. `payload` must hold `count` pixels in `format`;
    /// the decoder guarantees this.
    pub fn apply(&mut self, payload: &[u8], count: usize, format: PixelFormat) {
        let bpp = format.bytes_per_pixel();
        let mut pixels = payload.chunks_exact(bpp).take(count);
        let mut written = 0;

        'strips: for strip in &mut self.strips {
            for index in 0..strip.capacity() {
                let Some(px) = pixels.next() else {
                    break 'strips;
                };
                strip.set_pixel(index, format.decode_pixel(px));
                written += 1;
            }
        }

        for strip in &mut self.strips {
            strip.request_render();
        }

        trace!(written, count, strips = self.strips.len(), "frame applied");
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Seven RGB pixels where pixel `i` is `(i, 10 + i, 20 + i)`.
    fn seven_pixels() -> Vec<u8> {
        (0..7u8).flat_map(|i| [i, 10 + i, 20 + i]).collect()
    }

    #[test]
    fn distributes_in_strip_order() {
        let strips = vec![MemoryStrip::new(5), MemoryStrip::new(3), MemoryStrip::new(2)];
        let mut applier = FrameApplier::new(strips);
        assert_eq!(applier.total_leds(), 10);

        applier.apply(&seven_pixels(), 7, PixelFormat::Rgb);
        let strips = applier.strips();

        for i in 0..5 {
            let expect = Color::from_rgb(i as u8, 10 + i as u8, 20 + i as u8);
            assert_eq!(strips[0].pixels()[i], expect);
        }
        assert_eq!(strips[1].pixels()[0], Color::from_rgb(5, 15, 25));
        assert_eq!(strips[1].pixels()[1], Color::from_rgb(6, 16, 26));
        assert_eq!(strips[1].pixels()[2], Color::BLACK);
        assert!(strips[2].pixels().iter().all(|&c| c == Color::BLACK));

        for strip in strips {
            assert_eq!(strip.render_count(), 1);
        }
    }

    #[test]
    fn excess_pixels_are_dropped() {
        let mut applier = FrameApplier::new(vec![MemoryStrip::new(2), MemoryStrip::new(1)]);
        applier.apply(&seven_pixels(), 7, PixelFormat::Rgb);

        let strips = applier.strips();
        assert_eq!(strips[0].pixels()[1], Color::from_rgb(1, 11, 21));
        assert_eq!(strips[1].pixels()[0], Color::from_rgb(2, 12, 22));
    }

    #[test]
    fn every_strip_renders_once_per_frame() {
        let mut applier = FrameApplier::new(vec![MemoryStrip::new(4), MemoryStrip::new(4)]);
        let payload = [255u8, 0, 0, 0];
        applier.apply(&payload, 1, PixelFormat::Rgbw);
        applier.apply(&payload, 1, PixelFormat::Rgbw);

        for strip in applier.strips() {
            assert_eq!(strip.render_count(), 2);
        }
        assert_eq!(applier.strips()[0].pixels()[0], Color::new(255, 0, 0, 0));
    }

    #[test]
    fn boxed_strips_work_through_the_trait() {
        let strips: Vec<Box<dyn OutputStrip>> = vec![Box::new(MemoryStrip::new(3))];
        let mut applier = FrameApplier::new(strips);
        assert_eq!(applier.total_leds(), 3);
        applier.apply(&[1, 2, 3], 1, PixelFormat::Bgr);
        assert_eq!(applier.strips()[0].capacity(), 3);
    }
}
