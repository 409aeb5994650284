//! Pure geometry and normalization helpers shared by the visualisers.
//!
//! Nothing in here owns state; every function is deterministic in its inputs.

mod mesh;
mod radii;

// Re-export public types
pub use mesh::{generate_segmented_bar_mesh, BarVertex, SegmentedBarMesh, CORNERS_PER_SEGMENT};
pub use radii::{
    gap_total, generate_radial_bar_radii, line_width_increment, pick_gap_upper_bound, RadialBand,
    MAX_GAP_SHARE,
};

use glam::Vec2;

/// Map a decibel value into [0, 1] against `(min, max)`.
///
/// Values outside the range clamp; NaN maps to 0. Callers guarantee `min < max`.
pub fn normalize(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Overall loudness proxy: the normalized mean of the lowest quarter of the bins.
pub fn intensity(frequency_data: &[f32], min: f32, max: f32) -> f32 {
    if frequency_data.is_empty() {
        return 0.0;
    }
    let count = (frequency_data.len() / 4).max(1);
    let sum: f32 = frequency_data[..count].iter().sum();
    normalize(sum / count as f32, min, max)
}

/// Per-axis scale that keeps a unit circle circular on a `width` x `height` target
pub fn aspect_scale(width: f32, height: f32) -> Vec2 {
    let min_dim = width.min(height);
    Vec2::new(min_dim / width, min_dim / height)
}

/// Decode 0xRRGGBB into linear [0, 1] components
pub fn hex_to_rgb(hex: u32) -> [f32; 3] {
    let mask = 0xff;
    [
        ((hex >> 16) & mask) as f32 / 255.0,
        ((hex >> 8) & mask) as f32 / 255.0,
        (hex & mask) as f32 / 255.0,
    ]
}

/// An angle with its cosine and sine evaluated once
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angle {
    pub radians: f32,
    pub cos: f32,
    pub sin: f32,
}

impl Angle {
    pub fn new(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self { radians, cos, sin }
    }

    /// Point at `radius` from `center` along this angle
    pub fn point(&self, center: Vec2, radius: f32) -> Vec2 {
        center + Vec2::new(self.cos, self.sin) * radius
    }
}
