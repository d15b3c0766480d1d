//! Test patterns, rendered one frame at a time.

use clap::ValueEnum;

use ledstream_core::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pattern {
    /// Every pixel white.
    Solid,
    /// A color wheel scrolling along the strip.
    Rainbow,
    /// A single lit pixel walking the strip.
    Chase,
}

impl Pattern {
    /// Colors for frame number `frame` on `leds` pixels.
    pub fn render(self, frame: u64, leds: usize) -> Vec<Color> {
        match self {
            Pattern::Solid => vec![Color::from_rgb(255, 255, 255); leds],
            Pattern::Rainbow => (0..leds)
                .map(|i| {
                    let offset = (i * 256 / leds.max(1)) as u64;
                    wheel(((offset + frame * 4) % 256) as u8)
                })
                .collect(),
            Pattern::Chase => {
                let mut colors = vec![Color::BLACK; leds];
                if leds > 0 {
                    colors[(frame % leds as u64) as usize] = Color::from_rgb(255, 64, 0);
                }
                colors
            }
        }
    }
}

/// Map `0..=255` onto a red, green, blue color wheel.
fn wheel(pos: u8) -> Color {
    let pos = pos as u16;
    let (r, g, b) = match pos {
        0..=84 => (255 - pos * 3, pos * 3, 0),
        85..=169 => {
            let p = pos - 85;
            (0, 255 - p * 3, p * 3)
        }
        _ => {
            let p = pos - 170;
            (p * 3, 0, 255 - p * 3)
        }
    };
    Color::from_rgb(r as u8, g as u8, b as u8)
}
