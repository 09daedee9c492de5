use eframe::egui::Color32;
use palette::{LinSrgb, Mix, Srgb};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sequential colormaps
// ---------------------------------------------------------------------------

// sRGB anchor colours, evenly spaced over 0..=1
const PLASMA: [[u8; 3]; 11] = [
    [0x0d, 0x08, 0x87],
    [0x41, 0x04, 0x9d],
    [0x6a, 0x00, 0xa8],
    [0x8f, 0x0d, 0xa4],
    [0xb1, 0x2a, 0x90],
    [0xcc, 0x47, 0x78],
    [0xe1, 0x64, 0x62],
    [0xf2, 0x84, 0x4b],
    [0xfc, 0xa6, 0x36],
    [0xfc, 0xce, 0x25],
    [0xf0, 0xf9, 0x21],
];

const VIRIDIS: [[u8; 3]; 5] = [
    [0x44, 0x01, 0x54],
    [0x3b, 0x52, 0x8b],
    [0x21, 0x91, 0x8c],
    [0x5e, 0xc9, 0x62],
    [0xfd, 0xe7, 0x25],
];

// Dark to light, i.e. already reversed
const BLUES_REVERSED: [[u8; 3]; 9] = [
    [0x08, 0x30, 0x6b],
    [0x08, 0x51, 0x9c],
    [0x21, 0x71, 0xb5],
    [0x42, 0x92, 0xc6],
    [0x6b, 0xae, 0xd6],
    [0x9e, 0xca, 0xe1],
    [0xc6, 0xdb, 0xef],
    [0xde, 0xeb, 0xf7],
    [0xf7, 0xfb, 0xff],
];

/// Perceptually ordered colormaps for sweeps, where colour tracks value order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Colormap {
    Plasma,
    Viridis,
    BluesReversed,
}

impl Colormap {
    fn anchors(&self) -> &'static [[u8; 3]] {
        match self {
            Colormap::Plasma => &PLASMA,
            Colormap::Viridis => &VIRIDIS,
            Colormap::BluesReversed => &BLUES_REVERSED,
        }
    }

    /// Colour at `t` in 0..=1, interpolated in linear RGB.
    pub fn at(&self, t: f64) -> Color32 {
        let anchors = self.anchors();
        let pos = t.clamp(0.0, 1.0) * (anchors.len() - 1) as f64;
        let lower = (pos.floor() as usize).min(anchors.len() - 2);
        let factor = (pos - lower as f64) as f32;

        let a = linear(anchors[lower]);
        let b = linear(anchors[lower + 1]);
        let rgb: Srgb = Srgb::from_linear(a.mix(b, factor));
        Color32::from_rgb(
            (rgb.red * 255.0).round() as u8,
            (rgb.green * 255.0).round() as u8,
            (rgb.blue * 255.0).round() as u8,
        )
    }
}

fn linear([r, g, b]: [u8; 3]) -> LinSrgb {
    Srgb::new(r, g, b).into_format::<f32>().into_linear()
}

/// A colormap restricted to `start..=stop`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColormapConfig {
    pub name: Colormap,
    pub start: f64,
    pub stop: f64,
}

impl ColormapConfig {
    /// `n` colours sampled at evenly spaced points from `start` to `stop`
    /// inclusive; a single colour sits at `start`.
    pub fn sample(&self, n: usize) -> Vec<Color32> {
        match n {
            0 => Vec::new(),
            1 => vec![self.name.at(self.start)],
            _ => (0..n)
                .map(|i| {
                    let t = self.start + (self.stop - self.start) * i as f64 / (n - 1) as f64;
                    self.name.at(t)
                })
                .collect(),
        }
    }
}
